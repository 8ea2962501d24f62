//! Output formatting for rollcall.
//!
//! This module provides formatters for displaying registration data in various formats.

mod json;
mod pretty;

use serde::Serialize;

use crate::api::{Class, NewStudent, Student};
use crate::cli::args::OutputFormat;
use crate::error::RollcallError;
use crate::features::sync::{DeadLetter, QueuedOperation};

pub use json::*;
pub use pretty::*;

/// Pending writes and service availability, shown after write commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub pending: usize,
    pub available: bool,
}

/// Format students based on output format
///
/// # Errors
///
/// Returns `RollcallError::Parse` if JSON serialization fails.
pub fn format_students(
    students: &[Student],
    pending: &[(usize, &NewStudent)],
    format: OutputFormat,
) -> Result<String, RollcallError> {
    match format {
        OutputFormat::Pretty => Ok(format_students_pretty(students, pending)),
        OutputFormat::Json => format_students_json(students, pending),
    }
}

/// Format classes based on output format
///
/// # Errors
///
/// Returns `RollcallError::Parse` if JSON serialization fails.
pub fn format_classes(classes: &[Class], format: OutputFormat) -> Result<String, RollcallError> {
    match format {
        OutputFormat::Pretty => Ok(format_classes_pretty(classes)),
        OutputFormat::Json => format_classes_json(classes),
    }
}

/// Format the offline queue based on output format
///
/// # Errors
///
/// Returns `RollcallError::Parse` if JSON serialization fails.
pub fn format_queue(
    operations: &[QueuedOperation],
    format: OutputFormat,
) -> Result<String, RollcallError> {
    match format {
        OutputFormat::Pretty => Ok(format_queue_pretty(operations)),
        OutputFormat::Json => format_queue_json(operations),
    }
}

/// Format dead letters based on output format
///
/// # Errors
///
/// Returns `RollcallError::Parse` if JSON serialization fails.
pub fn format_dead_letters(
    letters: &[DeadLetter],
    format: OutputFormat,
) -> Result<String, RollcallError> {
    match format {
        OutputFormat::Pretty => Ok(format_dead_letters_pretty(letters)),
        OutputFormat::Json => format_dead_letters_json(letters),
    }
}
