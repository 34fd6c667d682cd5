// src/core/mod.rs — Extraction and the iteration engine

pub mod engine;
pub mod extractor;
pub mod types;
