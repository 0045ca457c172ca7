//! Result encoding.
//!
//! This module provides functionality for:
//! - Encoding transform results to PNG (lossless, the default)
//! - Encoding transform results to JPEG with configurable quality
//!
//! Both encoders accept gray, RGB and RGBA buffers. JPEG has no alpha
//! channel, so RGBA input is flattened to RGB by dropping alpha.

mod jpeg;
mod png;

pub use jpeg::encode_jpeg;
pub use png::encode_png;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::{expected_len, RasterBuffer};

/// Errors that can occur while encoding a result.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match the declared layout
    #[error("Invalid pixel data: expected {expected} bytes (width * height * channels), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// Channel count other than 1, 3 or 4
    #[error("Cannot encode {0}-channel pixels")]
    UnsupportedChannels(u8),

    /// The codec itself failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Output container for a transform result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "camelCase")]
pub enum EncodeFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG at `quality` 1-100; values outside are clamped.
    Jpeg { quality: u8 },
}

impl EncodeFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            EncodeFormat::Png => "image/png",
            EncodeFormat::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// Encoded bytes together with the format that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: EncodeFormat,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Encode a buffer in the requested format.
pub fn encode(buffer: &RasterBuffer, format: EncodeFormat) -> Result<EncodedImage, EncodeError> {
    let bytes = match format {
        EncodeFormat::Png => encode_png(&buffer.pixels, buffer.width, buffer.height, buffer.channels)?,
        EncodeFormat::Jpeg { quality } => {
            encode_jpeg(&buffer.pixels, buffer.width, buffer.height, buffer.channels, quality)?
        }
    };
    Ok(EncodedImage { format, bytes })
}

/// Check dimensions, channel count and data length before handing pixels
/// to a codec.
fn check_pixels(pixels: &[u8], width: u32, height: u32, channels: u8) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }
    if !matches!(channels, 1 | 3 | 4) {
        return Err(EncodeError::UnsupportedChannels(channels));
    }
    let expected = expected_len(width, height, channels).unwrap_or(usize::MAX);
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}
