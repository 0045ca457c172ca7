//! Origin-aligned crop guidance for operand pairs.
//!
//! Crop regions are expressed in percent of each image's own dimensions,
//! the unit the crop UI works in. [`optimal_crop_size`] suggests the largest
//! rectangle both images share from the top-left corner; [`apply_crop`]
//! realizes a region on a buffer for callers that don't crop themselves.
//!
//! # Coordinate System
//!
//! - (0, 0) = top-left corner
//! - (100, 100) = bottom-right corner

use serde::{Deserialize, Serialize};

use crate::buffer::RasterBuffer;
use crate::error::{Result, TransformError};

/// A crop rectangle in percent of the source dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    /// Left edge (0 to 100).
    pub x: f64,
    /// Top edge (0 to 100).
    pub y: f64,
    /// Width (0 to 100).
    pub width: f64,
    /// Height (0 to 100).
    pub height: f64,
}

impl CropRegion {
    /// The whole image.
    pub const FULL: CropRegion = CropRegion {
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 100.0,
    };

    /// Check if this region covers the whole image.
    pub fn is_full(&self) -> bool {
        self.x <= 0.0 && self.y <= 0.0 && self.width >= 100.0 && self.height >= 100.0
    }
}

impl Default for CropRegion {
    fn default() -> Self {
        Self::FULL
    }
}

/// Largest origin-aligned rectangle shared by both images, as a crop
/// region for each of them.
///
/// The shared rectangle is `min(a.width, b.width) x min(a.height, b.height)`
/// pixels; each region expresses it relative to its own image.
///
/// # Errors
///
/// Returns `TransformError::InvalidInput` if either image has a zero
/// dimension.
pub fn optimal_crop_size(a: &RasterBuffer, b: &RasterBuffer) -> Result<(CropRegion, CropRegion)> {
    for buf in [a, b] {
        if buf.width == 0 || buf.height == 0 {
            return Err(TransformError::InvalidInput(format!(
                "cannot size a crop for a {}x{} image",
                buf.width, buf.height
            )));
        }
    }

    let min_width = a.width.min(b.width) as f64;
    let min_height = a.height.min(b.height) as f64;
    let region_for = |buf: &RasterBuffer| CropRegion {
        x: 0.0,
        y: 0.0,
        width: min_width / buf.width as f64 * 100.0,
        height: min_height / buf.height as f64 * 100.0,
    };
    Ok((region_for(a), region_for(b)))
}

/// Apply a percent crop region to a buffer.
///
/// # Behavior
///
/// - Coordinates extending beyond image bounds are clamped
/// - Minimum output dimension is 1x1 pixels
/// - A full region returns a copy of the original buffer
pub fn apply_crop(image: &RasterBuffer, region: &CropRegion) -> Result<RasterBuffer> {
    image.validate()?;

    // Fast path: full crop returns a clone
    if region.is_full() {
        return Ok(image.clone());
    }

    // Convert percent coordinates to pixel coordinates
    let src_w = image.width as f64;
    let src_h = image.height as f64;
    let to_px = |pct: f64, extent: f64| ((pct / 100.0).clamp(0.0, 1.0) * extent).round() as u32;

    let px_left = to_px(region.x, src_w).min(image.width.saturating_sub(1));
    let px_top = to_px(region.y, src_h).min(image.height.saturating_sub(1));
    let px_right = (px_left + to_px(region.width, src_w)).min(image.width);
    let px_bottom = (px_top + to_px(region.height, src_h)).min(image.height);

    // Ensure minimum dimensions
    let out_width = px_right.saturating_sub(px_left).max(1);
    let out_height = px_bottom.saturating_sub(px_top).max(1);

    let channels = image.channels as usize;
    let src_stride = image.width as usize * channels;
    let row_bytes = out_width as usize * channels;
    let mut output = Vec::with_capacity(row_bytes * out_height as usize);

    // Copy pixel data row by row
    for y in px_top..px_top + out_height {
        let start = y as usize * src_stride + px_left as usize * channels;
        output.extend_from_slice(&image.pixels[start..start + row_bytes]);
    }

    RasterBuffer::new(out_width, out_height, image.channels, output)
}
