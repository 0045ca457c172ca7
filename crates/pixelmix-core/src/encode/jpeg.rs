//! JPEG encoding for transform results.
//!
//! Gray buffers are written as single-channel JPEG, RGB as-is. RGBA is
//! flattened to RGB first since JPEG carries no alpha.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{check_pixels, EncodeError};

/// Encode 8-bit pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - Interleaved pixel data, row-major
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `channels` - 1 (gray), 3 (RGB) or 4 (RGBA, alpha is dropped)
/// * `quality` - JPEG quality (1-100, where 100 is highest quality)
///
/// # Quality Guidelines
///
/// * 90-100: High quality, suitable for further editing
/// * 80-90: Good quality, recommended for most uses
/// * Below 60: Low quality, visible artifacts
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    channels: u8,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    check_pixels(pixels, width, height, channels)?;

    // Clamp quality to valid range (1-100)
    let quality = quality.clamp(1, 100);

    let flattened;
    let (data, color) = match channels {
        1 => (pixels, ExtendedColorType::L8),
        3 => (pixels, ExtendedColorType::Rgb8),
        _ => {
            flattened = drop_alpha(pixels);
            (&flattened[..], ExtendedColorType::Rgb8)
        }
    };

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .write_image(data, width, height, color)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

fn drop_alpha(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect()
}
