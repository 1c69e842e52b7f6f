//! Error types for the table engine.

use tablesync_schema::SchemaError;
use thiserror::Error;

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Errors surfaced by the table engine and resource clients.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    /// Network failure, timeout, or a non-2xx response without a body.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// HTTP status, if a response arrived.
        status: Option<u16>,
    },

    /// The server rejected the request and said why.
    #[error("rejected by server ({status}): {reason}")]
    Validation {
        /// HTTP status.
        status: u16,
        /// Server-supplied reason.
        reason: String,
    },

    /// The addressed record does not exist on the server.
    #[error("record {key} not found on server")]
    NotFound {
        /// Rendered key tuple.
        key: String,
    },

    /// A successful response carried a body that is not a valid record.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The intent is not legal in the current edit state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        /// Current state.
        state: String,
        /// Rejected action.
        action: &'static str,
    },

    /// The intent names a record that is not in the cache.
    #[error("record {key} is not in the table")]
    UnknownRecord {
        /// Rendered key tuple.
        key: String,
    },

    /// Schema error (unknown field, bad record).
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl TableError {
    /// Creates a transport error for a request that got no response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
        }
    }

    /// Creates a transport error for an empty non-2xx response.
    pub fn status(status: u16) -> Self {
        Self::Transport {
            message: format!("server responded with status {status}"),
            status: Some(status),
        }
    }

    /// Returns true if the error came from the remote side.
    ///
    /// Remote errors leave local state untouched; the others are rejected
    /// before any request is sent.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            TableError::Transport { .. }
                | TableError::Validation { .. }
                | TableError::NotFound { .. }
                | TableError::Protocol(_)
        )
    }

    /// HTTP status of the failing response, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            TableError::Transport { status, .. } => *status,
            TableError::Validation { status, .. } => Some(*status),
            TableError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_errors() {
        assert!(TableError::transport("connection refused").is_remote());
        assert!(TableError::status(503).is_remote());
        assert!(TableError::NotFound { key: "Italy".into() }.is_remote());
        assert!(!TableError::UnknownRecord { key: "Italy".into() }.is_remote());
    }

    #[test]
    fn http_status() {
        assert_eq!(TableError::status(502).http_status(), Some(502));
        assert_eq!(TableError::transport("timeout").http_status(), None);
        assert_eq!(
            TableError::Validation {
                status: 422,
                reason: "population must be positive".into()
            }
            .http_status(),
            Some(422)
        );
    }

    #[test]
    fn error_display() {
        let err = TableError::InvalidTransition {
            state: "editing Italy".into(),
            action: "begin an edit",
        };
        assert_eq!(err.to_string(), "cannot begin an edit while editing Italy");

        let err = TableError::Validation {
            status: 400,
            reason: "email is required".into(),
        };
        assert_eq!(err.to_string(), "rejected by server (400): email is required");
    }
}
