//! CityPulse error types
//!
//! Defines the standardized error type shared by both inference engines.
//!
//! Two failure modes deliberately have no variant here: a missing trained
//! model is the engine's `Untrained` state (rule-only mode, not an error),
//! and a per-call model inference failure degrades that call to rule-only
//! scoring instead of surfacing.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CityPulse operations
pub type Result<T> = std::result::Result<T, PulseError>;

/// Errors that can occur across the CityPulse engines
#[derive(Error, Debug)]
pub enum PulseError {
    /// A reading field failed validation; surfaced to the caller unchanged
    #[error("Invalid reading field '{field}': {reason}")]
    InvalidReading { field: &'static str, reason: String },

    /// A persisted model artifact exists but cannot be decoded
    #[error("Corrupt model artifact at {path}: {detail}")]
    CorruptArtifact { path: PathBuf, detail: String },

    /// Artifact directory or file could not be written during training
    #[error("Model persistence failed: {0}")]
    Persistence(#[from] std::io::Error),

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Insufficient data points for a fitting operation
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_reading_display() {
        let error = PulseError::InvalidReading {
            field: "noise",
            reason: "must be finite".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid reading field 'noise': must be finite"
        );
    }

    #[test]
    fn test_corrupt_artifact_display() {
        let error = PulseError::CorruptArtifact {
            path: PathBuf::from("models/anomaly_model.bin"),
            detail: "unexpected end of file".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Corrupt model artifact at models/anomaly_model.bin: unexpected end of file"
        );
    }

    #[test]
    fn test_persistence_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only fs");
        let error: PulseError = io.into();
        assert!(matches!(error, PulseError::Persistence(_)));
        assert!(error.to_string().starts_with("Model persistence failed"));
    }

    #[test]
    fn test_invalid_parameter_display() {
        let error = PulseError::InvalidParameter {
            name: "alpha".to_string(),
            reason: "must be between 0 and 1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid parameter 'alpha': must be between 0 and 1"
        );
    }
}
