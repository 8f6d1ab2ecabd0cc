//! Error types with actionable diagnostics.
//!
//! Every failure the core can surface carries enough context for the caller
//! to act on it without consulting external documentation. Integrity
//! failures name the first offending record; validation failures name the
//! rejected field.

use thiserror::Error;

/// Result type alias for fairlens operations.
pub type Result<T> = std::result::Result<T, FairlensError>;

/// Errors that can occur in the fairness monitoring core.
#[derive(Error, Debug)]
pub enum FairlensError {
    /// Input to `evaluate` was rejected before any state change.
    #[error("Invalid evaluation input for '{field}': {message}")]
    Validation { field: String, message: String },

    /// A hash mismatch was found while walking the audit chain.
    ///
    /// The chain is never auto-repaired; the offending record is reported
    /// and all earlier records remain verifiable.
    #[error("Chain integrity violation at sequence {sequence_id}: {detail}")]
    ChainIntegrity { sequence_id: u64, detail: String },

    /// Analytics were requested over an empty history.
    ///
    /// Short-but-nonempty windows degrade instead of erroring; only the
    /// zero-record case is an error, and only where no explicit empty
    /// result type exists.
    #[error("Insufficient history: {needed} records required, {available} available")]
    InsufficientData { needed: usize, available: usize },

    /// A persistence write failed during append.
    ///
    /// Fatal for that call: no partial record is referenceable and the
    /// sequence number does not advance.
    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    /// The anchoring substrate could not be reached.
    ///
    /// Never propagates out of `evaluate`; anchoring is best-effort.
    #[error("Anchor service unavailable: {0}")]
    AnchorUnavailable(String),

    /// Record encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A record or anchor was not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl FairlensError {
    /// Create a validation error for a named input field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Check if this error is user-recoverable (bad input rather than a
    /// damaged store or internal fault).
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::InsufficientData { .. } | Self::NotFound(_)
        )
    }

    /// Get the error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "F001",
            Self::ChainIntegrity { .. } => "F010",
            Self::InsufficientData { .. } => "F020",
            Self::StorageWrite(_) => "F030",
            Self::AnchorUnavailable(_) => "F040",
            Self::Serialization(_) => "F050",
            Self::Io { .. } => "F051",
            Self::NotFound(_) => "F060",
        }
    }
}

impl From<serde_json::Error> for FairlensError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_unique() {
        let errors = vec![
            FairlensError::validation("n_samples", "must be positive"),
            FairlensError::ChainIntegrity { sequence_id: 0, detail: String::new() },
            FairlensError::InsufficientData { needed: 3, available: 0 },
            FairlensError::StorageWrite(String::new()),
            FairlensError::AnchorUnavailable(String::new()),
            FairlensError::Serialization(String::new()),
            FairlensError::NotFound(String::new()),
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_validation_is_user_error() {
        assert!(FairlensError::validation("groups", "empty").is_user_error());
        assert!(!FairlensError::StorageWrite("disk full".into()).is_user_error());
        assert!(!FairlensError::ChainIntegrity { sequence_id: 4, detail: "x".into() }
            .is_user_error());
    }

    #[test]
    fn test_integrity_error_names_sequence() {
        let err = FairlensError::ChainIntegrity {
            sequence_id: 17,
            detail: "content hash mismatch".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("17"));
        assert!(msg.contains("content hash mismatch"));
    }

    #[test]
    fn test_io_error_constructor() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = FairlensError::io("opening audit log", io_err);
        assert!(matches!(err, FairlensError::Io { .. }));
        assert!(err.to_string().contains("opening audit log"));
    }

    #[test]
    fn test_insufficient_data_reports_both_counts() {
        let err = FairlensError::InsufficientData { needed: 10, available: 2 };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("2"));
    }
}
