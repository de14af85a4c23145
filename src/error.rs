//! Error taxonomy for the credential engine.

use crate::remote::RemoteError;

/// Errors surfaced by backend operations.
///
/// Not-found is deliberately absent: reads that find nothing return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Malformed or missing input. Never retried.
    #[error("{0}")]
    Validation(String),

    /// Credential issuance attempted before the engine was configured.
    #[error("{0}")]
    Configuration(String),

    /// The remote account API rejected or failed a call. Message is the remote's own.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A lease is missing the internal data written at issuance.
    #[error("{0}")]
    InternalData(String),

    /// Storage, serialization or client construction failure.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl BackendError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BackendError::Validation(msg.into())
    }
}

pub type Result<T, E = BackendError> = std::result::Result<T, E>;
