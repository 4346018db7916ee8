//! Error taxonomy for the document sync pipeline.
//!
//! Parsing and layout never fail (an unusable edge list is simply an empty
//! graph), so every error here belongs to the save/load path.

use thiserror::Error;

/// A save payload that does not match the document shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid document field `{field}`: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Failure inside a document store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode document: {0}")]
    Encode(String),

    #[error("decode document: {0}")]
    Decode(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Anything that can go wrong between the autosave coordinator and the store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    /// Malformed payload. Retrying the same payload will never help.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The RPC round-trip itself failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server accepted the request but its store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Whether a later attempt with fresh input may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SyncError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_not_retryable() {
        let err = SyncError::from(ValidationError::new("id", "must not be empty"));
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "invalid document field `id`: must not be empty"
        );
    }

    #[test]
    fn transport_is_retryable() {
        assert!(SyncError::Transport("connection reset".into()).is_retryable());
    }
}
