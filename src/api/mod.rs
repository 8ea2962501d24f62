//! Client for the student registration service.
//!
//! The service exposes a small HTTP contract:
//! - `GET /health`
//! - `GET /students`, `POST /students`, `DELETE /students/{id}`
//! - `GET /classes`, `POST /classes/seed`

mod client;
mod types;

#[cfg(test)]
pub(crate) use client::testing::serve_once;
#[cfg(test)]
pub use client::MockBackend;
pub use client::{Backend, HttpBackend};
pub use types::{Class, NewStudent, Student, StudentDraft, StudentStatus};
