//! Class command implementation.
//!
//! Classes are read straight from the service; nothing here is queued.

use colored::Colorize;
use serde_json::json;

use super::Session;
use crate::cli::args::{ClassCommands, OutputFormat};
use crate::error::RollcallError;
use crate::output::{format_classes, to_json};

/// Execute class subcommands.
///
/// # Errors
///
/// Returns an error if the service cannot be reached or refuses the request.
pub fn class(
    session: &Session<'_>,
    cmd: ClassCommands,
    format: OutputFormat,
) -> Result<String, RollcallError> {
    match cmd {
        ClassCommands::List => {
            let classes = session.backend.list_classes()?;
            format_classes(&classes, format)
        }
        ClassCommands::Seed => {
            session.backend.seed_classes()?;
            match format {
                OutputFormat::Json => to_json(&json!({"seeded": true})),
                OutputFormat::Pretty => Ok(format!("{} Default classes created", "✓".green())),
            }
        }
    }
}
