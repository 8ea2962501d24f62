//! Core abstractions for rollcall.
//!
//! Shared input rules used by the CLI and the submission path, and the
//! filter applied to student listings.

mod filter;
mod validation;

pub use filter::{Filterable, StudentFilter};
pub use validation::{
    parse_date, validate_birth_date, validate_email, validate_name, NAME_MAX_CHARS,
    NAME_MIN_CHARS,
};
