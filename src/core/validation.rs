//! Input rules for student records.
//!
//! These run before anything is sent to the service or written to the
//! offline queue, so an invalid submission never leaves the machine.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::RollcallError;

/// Minimum name length, in characters.
pub const NAME_MIN_CHARS: usize = 3;
/// Maximum name length, in characters.
pub const NAME_MAX_CHARS: usize = 80;

#[allow(clippy::unwrap_used)]
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Validate and normalize a student name.
///
/// Leading and trailing whitespace is trimmed before the length check.
///
/// # Errors
///
/// Returns a validation error if the trimmed name is outside 3..=80 chars.
pub fn validate_name(name: &str) -> Result<String, RollcallError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();

    if len < NAME_MIN_CHARS || len > NAME_MAX_CHARS {
        return Err(RollcallError::validation(
            "name",
            format!("must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters (got {len})"),
        ));
    }

    Ok(trimmed.to_string())
}

/// Validate an optional email address.
///
/// A blank address is treated as absent.
///
/// # Errors
///
/// Returns a validation error if the address does not look like local@domain.
pub fn validate_email(email: Option<&str>) -> Result<Option<String>, RollcallError> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };

    if !EMAIL_RE.is_match(email) {
        return Err(RollcallError::validation(
            "email",
            format!("'{email}' does not look like local@domain"),
        ));
    }

    Ok(Some(email.to_string()))
}

/// Validate a birth date against today's date.
///
/// # Errors
///
/// Returns a validation error if the date lies in the future.
pub fn validate_birth_date(date: NaiveDate) -> Result<NaiveDate, RollcallError> {
    validate_birth_date_on(date, Local::now().date_naive())
}

fn validate_birth_date_on(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, RollcallError> {
    if date > today {
        return Err(RollcallError::validation(
            "birth date",
            format!("{date} is in the future"),
        ));
    }
    Ok(date)
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns a validation error if the input is not a calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, RollcallError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        RollcallError::validation("birth date", format!("'{input}' is not a YYYY-MM-DD date"))
    })
}
