//! Operation types for the offline queue.
//!
//! Defines the writes that can be buffered while the service is unreachable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::NewStudent;
use crate::error::RollcallError;

/// A write waiting to be replayed against the service.
///
/// Operations carry no identifier: their position in the queue is their
/// identity and their replay order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueuedOperation {
    /// Create a student (`POST /students`).
    CreateStudent(NewStudent),
    /// Delete a student that has a server-assigned id (`DELETE /students/{id}`).
    DeleteStudent { id: i64 },
}

impl QueuedOperation {
    /// Get the display name for this operation type.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::CreateStudent(_) => "Create Student",
            Self::DeleteStudent { .. } => "Delete Student",
        }
    }

    /// Short human description of the target.
    #[must_use]
    pub fn target(&self) -> String {
        match self {
            Self::CreateStudent(student) => student.name().to_string(),
            Self::DeleteStudent { id } => format!("#{id}"),
        }
    }

    /// The queued student, if this is a create.
    #[must_use]
    pub const fn as_create(&self) -> Option<&NewStudent> {
        match self {
            Self::CreateStudent(student) => Some(student),
            Self::DeleteStudent { .. } => None,
        }
    }

    /// Whether this is a queued create for a student with the given name.
    ///
    /// Names are compared case-insensitively after trimming.
    #[must_use]
    pub fn creates_student_named(&self, name: &str) -> bool {
        self.as_create()
            .is_some_and(|s| s.name().to_lowercase() == name.trim().to_lowercase())
    }
}

impl std::fmt::Display for QueuedOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.display_name(), self.target())
    }
}

/// An operation the service refused during reconciliation.
///
/// Kept aside so a rejected write is neither retried forever nor lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub operation: QueuedOperation,
    /// HTTP status of the rejection, when there was one.
    pub status: Option<u16>,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

impl DeadLetter {
    #[must_use]
    pub fn new(operation: QueuedOperation, error: &RollcallError) -> Self {
        let reason = match error {
            RollcallError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        };

        Self {
            operation,
            status: error.status(),
            reason,
            failed_at: Utc::now(),
        }
    }
}
