// Querydeck Backends - Error Types
//
// Failures of the collaborators the workspace talks to (script store,
// session storage, query executor). None of them may leave the tab registry
// half-updated: callers apply state only after a backend call succeeded.

use std::io;

use thiserror::Error;

/// Errors raised by script, session and query backends
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Backend not configured or unreachable
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed the operation
    #[error("backend operation failed: {0}")]
    OperationFailed(String),

    /// No script with this id exists in the store
    #[error("script {0} not found")]
    ScriptNotFound(u64),

    /// The store issued an id that cannot be a persisted script id
    #[error("store issued invalid script id {0}")]
    InvalidScriptId(i64),

    /// Encoding or decoding a payload failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Filesystem error while reading or writing local state
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<io::Error> for BackendError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::Unavailable("connection pool timed out".to_string()),
            sqlx::Error::PoolClosed => Self::Unavailable("connection pool closed".to_string()),
            _ => Self::OperationFailed(err.to_string()),
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackendError::ScriptNotFound(12);
        assert_eq!(err.to_string(), "script 12 not found");

        let err = BackendError::InvalidScriptId(-4);
        assert!(err.to_string().contains("-4"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
        let err: BackendError = io_err.into();
        assert!(matches!(err, BackendError::Io(_)));
    }

    #[test]
    fn test_sqlx_pool_errors_mean_unavailable() {
        let err: BackendError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, BackendError::Unavailable(_)));

        let err: BackendError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, BackendError::OperationFailed(_)));
    }
}
