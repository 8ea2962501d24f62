//! Error types for rollcall.

use thiserror::Error;

/// Errors that can occur while talking to the registration service or
/// managing the local offline queue.
#[derive(Debug, Error)]
pub enum RollcallError {
    /// The request could not complete (connection refused, DNS, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("Server rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Local input validation failed before anything was sent or queued.
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// The service answered with a success status but an unusable body.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RollcallError {
    /// Build a validation error for a named field.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Whether the failure means the service could not be reached at all.
    ///
    /// Network failures degrade to offline behaviour; everything else is an
    /// answer from the service (or a local problem) and must not be retried
    /// blindly.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// HTTP status for a rejected request, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RollcallError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            Self::Rejected {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else if e.is_decode() {
            Self::UnexpectedResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_classification() {
        assert!(RollcallError::Network("refused".to_string()).is_network());
        assert!(!RollcallError::Rejected {
            status: 422,
            message: "bad".to_string()
        }
        .is_network());
        assert!(!RollcallError::validation("name", "too short").is_network());
    }

    #[test]
    fn test_status() {
        let err = RollcallError::Rejected {
            status: 409,
            message: "duplicate email".to_string(),
        };
        assert_eq!(err.status(), Some(409));
        assert_eq!(RollcallError::Network("x".to_string()).status(), None);
    }

    #[test]
    fn test_display() {
        let err = RollcallError::validation("email", "must look like local@domain");
        assert_eq!(err.to_string(), "Invalid email: must look like local@domain");
    }
}
