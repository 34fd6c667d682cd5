// src/lib.rs — Library root for promptspec

pub mod api;
pub mod cli;
pub mod core;
pub mod evaluator;
pub mod infra;
pub mod memory;
pub mod util;
