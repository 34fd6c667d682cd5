// src/cli/migrate.rs — Database migration command
//
// Migrations run automatically whenever the store is opened; this command
// is for inspecting the schema version and rolling back during development.

use std::path::Path;

use crate::infra::paths;
use crate::memory::schema;

/// Show migration status, apply pending migrations, or roll back the latest.
pub fn run_migrate(db_path: &Path, status_only: bool, rollback: bool) -> anyhow::Result<()> {
    if !db_path.exists() && (status_only || rollback) {
        println!("No database found at: {}", db_path.display());
        return Ok(());
    }

    paths::ensure_parent(db_path)?;
    let conn = rusqlite::Connection::open(db_path)?;

    if status_only {
        return show_migration_status(&conn, db_path);
    }

    if rollback {
        match schema::rollback_last(&conn)? {
            Some(version) => println!("Rolled back migration v{version}."),
            None => println!("No migrations to roll back."),
        }
        return show_migration_status(&conn, db_path);
    }

    println!("Running database migrations...");
    schema::run_migrations(&conn)?;
    println!("Migrations complete.");
    show_migration_status(&conn, db_path)
}

fn show_migration_status(conn: &rusqlite::Connection, db_path: &Path) -> anyhow::Result<()> {
    let current = schema::current_version(conn)?;

    println!("Database: {}", db_path.display());
    println!(
        "Current schema version: {} (latest: {})",
        current,
        schema::latest_version()
    );

    let applied = schema::applied_migrations(conn)?;
    if applied.is_empty() {
        println!("No migrations have been run yet.");
        return Ok(());
    }

    println!("Applied migrations:");
    for (version, name, applied_at) in applied {
        println!("  v{version}: {name} (applied {applied_at})");
    }
    Ok(())
}
