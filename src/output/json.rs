//! JSON output formatting for rollcall.

use serde::Serialize;
use serde_json::json;

use crate::api::{Class, NewStudent, Student};
use crate::error::RollcallError;
use crate::features::sync::{DeadLetter, QueuedOperation};

/// Format students as JSON
///
/// Queued students carry their 1-based queue position.
///
/// # Errors
///
/// Returns `RollcallError::Parse` if JSON serialization fails.
pub fn format_students_json(
    students: &[Student],
    pending: &[(usize, &NewStudent)],
) -> Result<String, RollcallError> {
    let pending: Vec<_> = pending
        .iter()
        .map(|(index, student)| json!({ "position": index + 1, "student": student }))
        .collect();

    let output = json!({
        "count": students.len(),
        "items": students,
        "pending": pending,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format classes as JSON
///
/// # Errors
///
/// Returns `RollcallError::Parse` if JSON serialization fails.
pub fn format_classes_json(classes: &[Class]) -> Result<String, RollcallError> {
    let output = json!({
        "count": classes.len(),
        "items": classes
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format queued operations as JSON
///
/// # Errors
///
/// Returns `RollcallError::Parse` if JSON serialization fails.
pub fn format_queue_json(operations: &[QueuedOperation]) -> Result<String, RollcallError> {
    let items: Vec<_> = operations
        .iter()
        .enumerate()
        .map(|(index, op)| json!({ "position": index + 1, "operation": op }))
        .collect();

    let output = json!({
        "count": operations.len(),
        "items": items
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format dead letters as JSON
///
/// # Errors
///
/// Returns `RollcallError::Parse` if JSON serialization fails.
pub fn format_dead_letters_json(letters: &[DeadLetter]) -> Result<String, RollcallError> {
    let output = json!({
        "count": letters.len(),
        "items": letters
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Generic JSON formatter for any serializable type
///
/// # Errors
///
/// Returns `RollcallError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, RollcallError> {
    Ok(serde_json::to_string_pretty(value)?)
}
