//! `SQLite` database connection and operations.
//!
//! The database is stored at `~/.rollcall/rollcall.db` and contains a single
//! `slots` table: a small key/value area where each key holds one JSON
//! document (the offline queue, the dead-letter list).

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::Paths;
use crate::error::RollcallError;

use super::migrations;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the default location.
    ///
    /// Creates the database file and runs migrations if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open() -> Result<Self, RollcallError> {
        let paths = Paths::new()?;
        paths.ensure_dirs()?;
        Self::open_at(&paths.database)
    }

    /// Open the database at a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &std::path::Path) -> Result<Self, RollcallError> {
        let conn = Connection::open(path).map_err(|e| {
            RollcallError::Database(format!("Failed to open database {}: {e}", path.display()))
        })?;

        let db = Self { conn };
        db.migrate()?;

        Ok(db)
    }

    /// Open an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self, RollcallError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            RollcallError::Database(format!("Failed to open in-memory database: {e}"))
        })?;

        let db = Self { conn };
        db.migrate()?;

        Ok(db)
    }

    fn migrate(&self) -> Result<(), RollcallError> {
        migrations::run(&self.conn)
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, RollcallError> {
        migrations::get_version(&self.conn)
    }

    /// Read the raw contents of a slot, `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn read_slot(&self, key: &str) -> Result<Option<String>, RollcallError> {
        self.conn
            .query_row("SELECT value FROM slots WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| RollcallError::Database(format!("Failed to read slot {key}: {e}")))
    }

    /// Replace the contents of a slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn write_slot(&self, key: &str, value: &str) -> Result<(), RollcallError> {
        self.conn
            .execute(
                r"INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)
                  ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| RollcallError::Database(format!("Failed to write slot {key}: {e}")))?;

        Ok(())
    }

    /// Remove a slot. Removing a missing slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_slot(&self, key: &str) -> Result<(), RollcallError> {
        self.conn
            .execute("DELETE FROM slots WHERE key = ?1", [key])
            .map_err(|e| RollcallError::Database(format!("Failed to delete slot {key}: {e}")))?;

        Ok(())
    }
}
