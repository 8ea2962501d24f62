//! Path resolution for rollcall configuration and data files.
//!
//! All rollcall data is stored in `~/.rollcall/`:
//! - `config.yaml` - Main configuration file
//! - `rollcall.db` - SQLite database holding the offline queue

use std::path::PathBuf;

use crate::error::RollcallError;

/// Paths to rollcall configuration and data files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.rollcall/`
    pub root: PathBuf,
    /// Config file: `~/.rollcall/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.rollcall/rollcall.db`
    pub database: PathBuf,
}

impl Paths {
    /// Create paths based on the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, RollcallError> {
        let home = std::env::var("HOME").map_err(|_| {
            RollcallError::Config("Could not determine home directory".to_string())
        })?;

        Ok(Self::with_root(PathBuf::from(home).join(".rollcall")))
    }

    /// Create paths with a custom root directory (useful for testing).
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("rollcall.db"),
            root,
        }
    }

    /// Ensure the data directory exists, creating it if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), RollcallError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                RollcallError::Config(format!(
                    "Failed to create directory {}: {e}",
                    self.root.display()
                ))
            })?;
        }

        Ok(())
    }
}
