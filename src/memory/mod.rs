// src/memory/mod.rs — Spec store (SQLite)

pub mod schema;
pub mod store;
pub mod store_server;

pub use store_server::{spawn_store_server, StoreHandle};

use rusqlite::Connection;
use std::path::Path;

use crate::infra::paths;

/// Open (or create) the database at `path` and bring its schema up to date.
pub fn open_store(path: &Path) -> anyhow::Result<store::Store> {
    paths::ensure_parent(path)?;
    let conn = Connection::open(path)?;
    // Enable WAL mode for better concurrent performance
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    schema::run_migrations(&conn)?;
    tracing::info!("Spec store ready at {}", path.display());
    Ok(store::Store::new(conn))
}

/// Create an in-memory store (for testing).
pub fn in_memory_store() -> anyhow::Result<store::Store> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    schema::run_migrations(&conn)?;
    Ok(store::Store::new(conn))
}
