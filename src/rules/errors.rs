//! # Rule Store Errors

use thiserror::Error;

/// Result type for rule store and administration operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Rule store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("invalid action: \"{0}\"")]
    InvalidAction(String),

    #[error("invalid {field}: {reason}")]
    InvalidRule { field: &'static str, reason: String },

    #[error("rule store is not installed")]
    NotInstalled,

    #[error("rule store I/O error: {0}")]
    Io(String),

    #[error("rule store is corrupted: {0}")]
    Corrupted(String),

    #[error("rule store unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Errors raised by write-time validation, before anything is stored
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::InvalidAction(_) | StoreError::InvalidRule { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_action_message() {
        let err = StoreError::InvalidAction("explode".into());
        assert_eq!(err.to_string(), "invalid action: \"explode\"");
        assert!(err.is_validation());
    }

    #[test]
    fn test_io_is_not_validation() {
        assert!(!StoreError::Io("disk gone".into()).is_validation());
    }
}
