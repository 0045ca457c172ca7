//! The two public transforms: dual-image operations and single-image filters.
//!
//! Each invocation validates its inputs, opens a [`Scope`] for its working
//! matrices, runs the engine and encodes the result. Whatever happens on the
//! way, the scope releases every matrix it still owns when the call returns.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::buffer::RasterBuffer;
use crate::colorspace::{adapt_for_operation, convert_channels, to_gray, unify_channels};
use crate::dual::{OperationKind, OperationRequest};
use crate::encode::{encode, EncodeFormat, EncodedImage};
use crate::error::Result;
use crate::filter::{Filter, FilterRequest};
use crate::normalize::{normalize_into, FilterType};
use crate::scope::{MatId, Scope};

/// Per-call configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    /// Resampling filter used when an operand is resized to the working size.
    pub resize_filter: FilterType,
    /// Container for the encoded result.
    pub encoding: EncodeFormat,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resize_filter(mut self, resize_filter: FilterType) -> Self {
        self.resize_filter = resize_filter;
        self
    }

    pub fn with_encoding(mut self, encoding: EncodeFormat) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Output of a transform: the raw pixels and their encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub buffer: RasterBuffer,
    pub encoded: EncodedImage,
}

/// Apply a dual-image operation with default options.
///
/// See [`apply_dual_op_with`].
pub fn apply_dual_op(a: &RasterBuffer, b: &RasterBuffer, request: &OperationRequest) -> Result<TransformResult> {
    apply_dual_op_with(a, b, request, &TransformOptions::default())
}

/// Apply a dual-image operation.
///
/// Both operands are brought to `(max(a.width, b.width), max(a.height,
/// b.height))`. Unless the operator is `Not`, the operand with fewer channels
/// is promoted to the other's layout. Bitwise operators work on gray copies
/// when the request asks for grayscale.
///
/// # Errors
///
/// - `TransformError::InvalidInput` for malformed or zero-sized buffers
/// - `TransformError::InvalidParameter` for blend weights outside [0, 1]
/// - `TransformError::ResourceAllocationFailure` if a working matrix
///   cannot be allocated
pub fn apply_dual_op_with(
    a: &RasterBuffer,
    b: &RasterBuffer,
    request: &OperationRequest,
    options: &TransformOptions,
) -> Result<TransformResult> {
    a.validate()?;
    b.validate()?;
    let op = request.validate()?;
    let kind = op.kind();
    debug!(
        "apply_dual_op: {} on {}x{}x{} and {}x{}x{} (gray: {})",
        kind,
        a.width,
        a.height,
        a.channels,
        b.width,
        b.height,
        b.channels,
        request.grayscale_requested
    );

    let mut scope = Scope::new("apply_dual_op");
    let (a_id, b_id) = normalize_into(&mut scope, a, b, options.resize_filter)?;
    let (a_id, b_id) = if kind == OperationKind::Not {
        (a_id, b_id)
    } else {
        unify_channels(&mut scope, a_id, b_id)?
    };
    let a_id = adapt_for_operation(&mut scope, a_id, kind, request.grayscale_requested)?;
    let b_id = adapt_for_operation(&mut scope, b_id, kind, request.grayscale_requested)?;

    let out = op.execute(&mut scope, a_id, b_id)?;
    finish(&mut scope, out, options.encoding)
}

/// Apply a single-image filter with default options.
///
/// See [`apply_filter_with`].
pub fn apply_filter(image: &RasterBuffer, request: &FilterRequest) -> Result<TransformResult> {
    apply_filter_with(image, request, &TransformOptions::default())
}

/// Apply a single-image filter.
///
/// With `grayscale_requested` the image is reduced to gray and expanded back
/// to its own channel count before filtering, so the output layout always
/// matches the input.
///
/// # Errors
///
/// - `TransformError::InvalidInput` for a malformed or zero-sized buffer
/// - `TransformError::UnsupportedFilter` for a name outside the catalog
/// - `TransformError::InvalidParameter` for parameters the filter rejects
/// - `TransformError::ResourceAllocationFailure` if a working matrix
///   cannot be allocated
pub fn apply_filter_with(
    image: &RasterBuffer,
    request: &FilterRequest,
    options: &TransformOptions,
) -> Result<TransformResult> {
    image.validate()?;
    let filter = Filter::from_request(request)?;
    debug!(
        "apply_filter: {:?} on {}x{}x{} (gray: {})",
        filter, image.width, image.height, image.channels, request.grayscale_requested
    );

    let mut scope = Scope::new("apply_filter");
    let mut src = scope.import(image)?;
    if request.grayscale_requested {
        let gray = to_gray(&mut scope, src)?;
        let expanded = convert_channels(&mut scope, gray, image.channels)?;
        if expanded != src {
            scope.release(src);
        }
        if gray != expanded && gray != src {
            scope.release(gray);
        }
        src = expanded;
    }

    let out = filter.apply(&mut scope, src)?;
    finish(&mut scope, out, options.encoding)
}

/// Move the result out of the scope and encode it.
fn finish(scope: &mut Scope, out: MatId, encoding: EncodeFormat) -> Result<TransformResult> {
    let buffer = scope.take_buffer(out)?;
    let encoded = encode(&buffer, encoding)?;
    Ok(TransformResult { buffer, encoded })
}
