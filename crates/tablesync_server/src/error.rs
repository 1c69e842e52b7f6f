//! Error types for the resource server.

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while serving a request.
///
/// Every variant maps to an HTTP status; the message becomes the
/// `detail` of the error body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// Malformed body, blank key field, wrong key arity.
    #[error("{0}")]
    InvalidRequest(String),

    /// No resource with this name.
    #[error("unknown resource `{0}`")]
    UnknownResource(String),

    /// No record with this key.
    #[error("no {resource} record with key {key}")]
    NotFound {
        /// Resource name.
        resource: String,
        /// Rendered key.
        key: String,
    },

    /// Key already taken.
    #[error("{0}")]
    Conflict(String),

    /// Method not supported on this path.
    #[error("method {method} not allowed on {path}")]
    MethodNotAllowed {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status for this error.
    pub fn status(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) => 400,
            ServerError::UnknownResource(_) | ServerError::NotFound { .. } => 404,
            ServerError::MethodNotAllowed { .. } => 405,
            ServerError::Conflict(_) => 409,
            ServerError::Internal(_) => 500,
        }
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status() >= 500
    }

    /// JSON error body, `{"detail": "..."}`.
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({ "detail": self.to_string() })
    }
}

impl From<tablesync_schema::SchemaError> for ServerError {
    fn from(err: tablesync_schema::SchemaError) -> Self {
        ServerError::InvalidRequest(err.to_string())
    }
}
