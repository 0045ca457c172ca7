//! Error types for the transform pipeline.

use thiserror::Error;

use crate::encode::EncodeError;

/// Errors surfaced by [`apply_dual_op`](crate::apply_dual_op) and
/// [`apply_filter`](crate::apply_filter).
#[derive(Debug, Error)]
pub enum TransformError {
    /// The raster buffer is malformed or zero-sized.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The operation kind is not one of the supported dual-image operators.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The filter name is not in the filter catalog.
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// A parameter value lies outside its declared domain.
    #[error("Invalid parameter '{name}' = {value}: {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    /// A working matrix could not be allocated.
    #[error("Failed to allocate {bytes} bytes for a {rows}x{cols}x{channels} matrix")]
    ResourceAllocationFailure {
        rows: u32,
        cols: u32,
        channels: u8,
        bytes: usize,
    },

    /// A transform step failed after its inputs were validated.
    #[error("Internal processing failure: {0}")]
    InternalProcessingFailure(String),
}

impl TransformError {
    pub(crate) fn invalid_parameter(
        name: impl Into<String>,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        TransformError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<EncodeError> for TransformError {
    fn from(err: EncodeError) -> Self {
        TransformError::InternalProcessingFailure(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TransformError>;
