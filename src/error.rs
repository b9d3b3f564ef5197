//! Failure conditions surfaced by the reduction pipeline.
//!
//! Every stage reports through [`ReduceError`] so callers can tell "bad input"
//! ([`InvalidInputKind`](ReduceError::InvalidInputKind),
//! [`UnsupportedFormat`](ReduceError::UnsupportedFormat),
//! [`CorruptData`](ReduceError::CorruptData)) from "bad density"
//! ([`InvalidScale`](ReduceError::InvalidScale)) from "encoder rejected output"
//! ([`EncodingFailure`](ReduceError::EncodingFailure)). The pipeline never
//! re-wraps a stage's error.

use crate::registry::SourceId;
use thiserror::Error;

/// Result alias for reduction operations.
pub type Result<T> = std::result::Result<T, ReduceError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReduceError {
    /// A non-image file was offered to the registry.
    #[error("{name} is not an image (media type: {media_type:?})")]
    InvalidInputKind { name: String, media_type: String },

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt image data: {0}")]
    CorruptData(String),

    /// Density (or baseline) is non-positive, or the scaled size collapses to zero.
    #[error("Invalid scale: density {density} against baseline {baseline}")]
    InvalidScale { density: f64, baseline: f64 },

    #[error("Encoding failed: {0}")]
    EncodingFailure(String),

    /// A preview was requested without an id while several images are registered.
    #[error("Ambiguous selection: {candidates} images registered, pick one by id")]
    AmbiguousSelection { candidates: usize },

    #[error("No image registered with id {0}")]
    UnknownSource(SourceId),

    #[error("No images registered")]
    EmptyRegistry,

    #[error("Cancelled before start")]
    Cancelled,

    /// A background task panicked or was aborted.
    #[error("Task failed: {0}")]
    Task(String),
}

impl ReduceError {
    /// True for conditions caused by the input bytes rather than the settings.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInputKind { .. } | Self::UnsupportedFormat(_) | Self::CorruptData(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_classified() {
        assert!(ReduceError::CorruptData("eof".into()).is_input_error());
        assert!(ReduceError::UnsupportedFormat("?".into()).is_input_error());
        assert!(
            !ReduceError::InvalidScale {
                density: 0.0,
                baseline: 72.0
            }
            .is_input_error()
        );
        assert!(!ReduceError::EncodingFailure("x".into()).is_input_error());
    }

    #[test]
    fn messages_name_the_offending_input() {
        let err = ReduceError::InvalidInputKind {
            name: "notes.txt".into(),
            media_type: "text/plain".into(),
        };
        assert_eq!(
            err.to_string(),
            "notes.txt is not an image (media type: \"text/plain\")"
        );
        assert_eq!(
            ReduceError::AmbiguousSelection { candidates: 3 }.to_string(),
            "Ambiguous selection: 3 images registered, pick one by id"
        );
    }
}
