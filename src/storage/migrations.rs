//! Database migrations for rollcall.
//!
//! Each migration is a function that upgrades the schema by one version.
//! Migrations are run automatically when the database is opened.

use rusqlite::Connection;

use crate::error::RollcallError;

/// Current schema version.
const CURRENT_VERSION: i32 = 1;

/// Get the current schema version from the database.
///
/// Returns 0 if no version has been set (new database).
pub fn get_version(conn: &Connection) -> Result<i32, RollcallError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| RollcallError::Database(format!("Failed to get schema version: {e}")))
}

fn set_version(conn: &Connection, version: i32) -> Result<(), RollcallError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| RollcallError::Database(format!("Failed to set schema version: {e}")))
}

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<(), RollcallError> {
    let current = get_version(conn)?;

    if current >= CURRENT_VERSION {
        return Ok(());
    }

    for version in (current + 1)..=CURRENT_VERSION {
        run_migration(conn, version)?;
        set_version(conn, version)?;
    }

    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> Result<(), RollcallError> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(RollcallError::Database(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: named slots.
///
/// Each slot holds one JSON document under a fixed key, e.g. the offline
/// queue or its dead-letter list.
fn migrate_v1(conn: &Connection) -> Result<(), RollcallError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS slots (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| RollcallError::Database(format!("Migration v1 failed: {e}")))
}
