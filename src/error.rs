//! Error handling for headfx
//!
//! Configuration and parameter errors are reported synchronously and leave
//! the previous state untouched. Processing itself never fails once the
//! buffer shape has been validated.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for headfx operations
pub type Result<T> = std::result::Result<T, FxError>;

/// Main error type for headfx operations
#[derive(Error, Debug)]
pub enum FxError {
    // Configuration Errors
    #[error("Invalid sample rate: {rate} Hz (must be finite and positive)")]
    InvalidSampleRate { rate: f64 },

    #[error("Unsupported channel count: {channels} (only stereo is supported)")]
    UnsupportedChannelCount { channels: u16 },

    #[error("Unsupported sample format: {format}")]
    UnsupportedFormat { format: String },

    // Parameter Errors
    #[error("Invalid parameter {param}: {value} (expected {expected})")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    // Processing Errors
    #[error("Sample format mismatch: chain configured for {expected}, got {actual}")]
    FormatMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Buffer mismatch: {reason}")]
    BufferMismatch { reason: String },

    // I/O Errors
    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FxError {
    /// Shorthand for an out-of-range or malformed parameter value
    pub fn invalid_parameter(
        param: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        FxError::InvalidParameter {
            param: param.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::InvalidSampleRate { .. } => "INVALID_SAMPLE_RATE",
            FxError::UnsupportedChannelCount { .. } => "UNSUPPORTED_CHANNEL_COUNT",
            FxError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            FxError::InvalidParameter { .. } => "INVALID_PARAMETER",
            FxError::UnknownParameter { .. } => "UNKNOWN_PARAMETER",
            FxError::FormatMismatch { .. } => "FORMAT_MISMATCH",
            FxError::BufferMismatch { .. } => "BUFFER_MISMATCH",
            FxError::FileReadError { .. } => "FILE_READ_ERROR",
            FxError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            FxError::Io(_) => "IO_ERROR",
            FxError::Wav(_) => "WAV_ERROR",
            FxError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Rejected configuration leaves the chain in its previous state, so the
    /// caller may simply retry with corrected values.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FxError::InvalidSampleRate { .. }
                | FxError::UnsupportedChannelCount { .. }
                | FxError::InvalidParameter { .. }
                | FxError::UnknownParameter { .. }
                | FxError::FormatMismatch { .. }
                | FxError::BufferMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = FxError::InvalidSampleRate { rate: 0.0 };
        assert_eq!(err.error_code(), "INVALID_SAMPLE_RATE");

        let err = FxError::invalid_parameter("compression.ratio", 12.0, "1.0 to 11.0");
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
        assert_eq!(
            err.to_string(),
            "Invalid parameter compression.ratio: 12 (expected 1.0 to 11.0)"
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(FxError::UnsupportedChannelCount { channels: 6 }.is_recoverable());
        let io = FxError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(!io.is_recoverable());
        assert_eq!(io.error_code(), "IO_ERROR");
    }
}
