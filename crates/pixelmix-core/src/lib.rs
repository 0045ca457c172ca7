//! PixelMix Core - Image transform library
//!
//! This crate provides the transform pipeline behind PixelMix: pixel-wise
//! operations over two images, a catalog of single-image filters, and
//! encoding of the results.
//!
//! # Pipeline
//!
//! 1. Validate the input buffers and the request
//! 2. Normalize operands to a common size (dual operations only)
//! 3. Adapt channel layouts (gray conversion, channel promotion)
//! 4. Run the operation or filter on scope-owned working matrices
//! 5. Move the result out and encode it
//!
//! Every working matrix lives in a per-call [`Scope`](scope::Scope) and is
//! released when the call returns; [`live_mat_count`] exposes the count for
//! leak checks.

pub mod buffer;
pub mod colorspace;
pub mod crop;
pub mod dual;
pub mod encode;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod pipeline;
pub mod scope;

pub use buffer::RasterBuffer;
pub use crop::{apply_crop, optimal_crop_size, CropRegion};
pub use dual::{DualOp, OperationKind, OperationRequest};
pub use encode::{EncodeError, EncodeFormat, EncodedImage};
pub use error::{Result, TransformError};
pub use filter::{filter_catalog, Filter, FilterKind, FilterRequest, FilterSpec, KernelSize, ParamKind, ParamValue, ParameterSpec};
pub use normalize::FilterType;
pub use pipeline::{apply_dual_op, apply_dual_op_with, apply_filter, apply_filter_with, TransformOptions, TransformResult};
pub use scope::live_mat_count;

/// Names of every catalog filter, in menu order.
pub fn filter_names() -> Vec<&'static str> {
    filter_catalog().iter().map(|spec| spec.name).collect()
}
