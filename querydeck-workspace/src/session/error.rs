use thiserror::Error;

use crate::backends::BackendError;

/// Failures while encoding, decoding or storing a session snapshot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Stored snapshot could not be parsed; treated as "no prior session"
    #[error("malformed session snapshot: {0}")]
    Malformed(String),

    #[error("failed to encode session snapshot: {0}")]
    Encode(String),

    #[error("session storage failed: {0}")]
    Storage(#[from] BackendError),
}

pub type SessionResult<T> = Result<T, SessionError>;
