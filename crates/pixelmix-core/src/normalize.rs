//! Bringing two operands to a common working size.
//!
//! The working size is the per-axis maximum of both inputs. An operand that
//! is already that size is imported as-is; the other is resized with the
//! `image` crate's resampling filters.

use image::{ImageBuffer, Luma, Pixel, Rgb, Rgba};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::buffer::RasterBuffer;
use crate::error::{Result, TransformError};
use crate::scope::{MatId, Scope};

/// Filter type for resizing operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    #[default]
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Working size for a pair of operands: the larger extent on each axis.
///
/// # Errors
///
/// Returns `TransformError::InvalidInput` if either operand has a zero
/// dimension.
pub fn target_size(a: &RasterBuffer, b: &RasterBuffer) -> Result<(u32, u32)> {
    for buf in [a, b] {
        if buf.width == 0 || buf.height == 0 {
            return Err(TransformError::InvalidInput(format!(
                "cannot normalize a {}x{} operand",
                buf.width, buf.height
            )));
        }
    }
    Ok((a.width.max(b.width), a.height.max(b.height)))
}

/// Resize a buffer to exact dimensions, keeping its channel layout.
///
/// # Errors
///
/// Returns `TransformError::InvalidInput` for zero target dimensions or a
/// malformed source buffer.
pub fn resize(
    buffer: &RasterBuffer,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<RasterBuffer> {
    if width == 0 || height == 0 {
        return Err(TransformError::InvalidInput(format!(
            "cannot resize to {width}x{height}"
        )));
    }

    // Fast path: if dimensions match, just clone
    if buffer.width == width && buffer.height == height {
        return Ok(buffer.clone());
    }

    let pixels = match buffer.channels {
        1 => resize_raw::<Luma<u8>>(buffer, width, height, filter)?,
        3 => resize_raw::<Rgb<u8>>(buffer, width, height, filter)?,
        4 => resize_raw::<Rgba<u8>>(buffer, width, height, filter)?,
        n => {
            return Err(TransformError::InvalidInput(format!(
                "unsupported channel count {n}"
            )))
        }
    };
    RasterBuffer::new(width, height, buffer.channels, pixels)
}

fn resize_raw<P>(buffer: &RasterBuffer, width: u32, height: u32, filter: FilterType) -> Result<Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let view = ImageBuffer::<P, &[u8]>::from_raw(buffer.width, buffer.height, &buffer.pixels[..])
        .ok_or_else(|| {
            TransformError::InvalidInput(format!(
                "pixel data does not fill {}x{}x{}",
                buffer.width, buffer.height, buffer.channels
            ))
        })?;
    Ok(image::imageops::resize(&view, width, height, filter.to_image_filter()).into_raw())
}

/// Load both operands into `scope` at their common working size.
///
/// An operand already at the working size is copied in unchanged; the other
/// is resampled with `filter` and moved in without a further copy.
pub fn normalize_into(
    scope: &mut Scope,
    a: &RasterBuffer,
    b: &RasterBuffer,
    filter: FilterType,
) -> Result<(MatId, MatId)> {
    let (width, height) = target_size(a, b)?;
    let a_id = load_at_size(scope, a, width, height, filter)?;
    let b_id = load_at_size(scope, b, width, height, filter)?;
    Ok((a_id, b_id))
}

fn load_at_size(
    scope: &mut Scope,
    buffer: &RasterBuffer,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<MatId> {
    if buffer.dimensions() == (width, height) {
        return scope.import(buffer);
    }
    debug!(
        "resizing operand {}x{} -> {}x{} ({:?})",
        buffer.width, buffer.height, width, height, filter
    );
    let resized = resize(buffer, width, height, filter)?;
    Ok(scope.adopt(resized))
}
