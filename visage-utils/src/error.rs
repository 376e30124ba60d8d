//! Error taxonomy shared across the visage workspace.
//!
//! The workspace uses `anyhow::Result` at function boundaries (with context
//! attached where it helps), but every deliberately raised error is one of
//! the typed variants below so callers and tests can downcast and branch on
//! the class of failure.
//!
//! Two of the variants never surface as raised errors from the pipeline
//! functions: `MissingLandmark` and `DetectionMiss` describe expected misses
//! and are reported through [`crate::result::OpResult`] sentinel metadata so
//! batch and live callers can continue past a bad frame. They exist here so
//! the pure heuristic functions can return them and so the sentinel encoding
//! has a single source of truth for its error strings.

use std::path::PathBuf;

use thiserror::Error;

/// Classified failure raised (or encoded) by visage operations.
#[derive(Debug, Error)]
pub enum VisageError {
    /// A parameter failed a type or range check. Always raised before any
    /// library call; never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A required landmark index was absent from an otherwise successful
    /// detection. Encoded as a sentinel, not raised, by pipeline functions.
    #[error("missing landmark index {0}")]
    MissingLandmark(usize),

    /// The underlying model found nothing. Sentinel treatment, as above.
    /// Carries a self-describing message ("no face landmarks detected").
    #[error("{0}")]
    DetectionMiss(String),

    /// A result accessor needed an image or data payload that is not there.
    #[error("empty result: {0}")]
    EmptyResult(&'static str),

    /// Encoding, decoding, or a filesystem operation failed. Raised
    /// immediately and never retried automatically.
    #[error("i/o failure on {}: {reason}", .path.display())]
    IoFailure { path: PathBuf, reason: String },
}

impl VisageError {
    /// Convenience constructor for [`VisageError::InvalidInput`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Convenience constructor for [`VisageError::DetectionMiss`].
    pub fn miss(msg: impl Into<String>) -> Self {
        Self::DetectionMiss(msg.into())
    }

    /// Convenience constructor for [`VisageError::IoFailure`].
    pub fn io(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::IoFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Downcast an `anyhow::Error` to the workspace taxonomy, if it is one.
pub fn classify(err: &anyhow::Error) -> Option<&VisageError> {
    err.downcast_ref::<VisageError>()
}
