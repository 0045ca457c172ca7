//! In-memory raster buffer exchanged between the caller and the pipeline.

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::error::{Result, TransformError};

/// Channel counts a [`RasterBuffer`] may carry.
pub const SUPPORTED_CHANNELS: [u8; 3] = [1, 3, 4];

/// A decoded image as an interleaved 8-bit pixel grid.
///
/// Channel interpretation: 1 = gray, 3 = RGB, 4 = RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Number of interleaved channels per pixel.
    pub channels: u8,
    /// Pixel data in row-major order.
    /// Length must be width * height * channels.
    pub pixels: Vec<u8>,
}

impl RasterBuffer {
    /// Create a buffer, validating dimensions, channel count and data length.
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Result<Self> {
        let buffer = Self {
            width,
            height,
            channels,
            pixels,
        };
        buffer.validate()?;
        Ok(buffer)
    }

    /// Create a buffer filled with a single value.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Result<Self> {
        let len = expected_len(width, height, channels).ok_or_else(|| {
            TransformError::InvalidInput(format!("{width}x{height}x{channels} overflows"))
        })?;
        Self::new(width, height, channels, vec![value; len])
    }

    /// Check the buffer invariants.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidInput` for a zero dimension, an
    /// unsupported channel count, or a pixel length that doesn't match.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TransformError::InvalidInput(format!(
                "zero-sized buffer ({}x{})",
                self.width, self.height
            )));
        }
        if !SUPPORTED_CHANNELS.contains(&self.channels) {
            return Err(TransformError::InvalidInput(format!(
                "unsupported channel count {}",
                self.channels
            )));
        }
        let expected = expected_len(self.width, self.height, self.channels).ok_or_else(|| {
            TransformError::InvalidInput(format!(
                "{}x{}x{} overflows",
                self.width, self.height, self.channels
            ))
        })?;
        if self.pixels.len() != expected {
            return Err(TransformError::InvalidInput(format!(
                "expected {} bytes, got {}",
                expected,
                self.pixels.len()
            )));
        }
        Ok(())
    }

    /// Create a buffer from an 8-bit RGBA image.
    pub fn from_rgba_image(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: 4,
            pixels: img.into_raw(),
        }
    }

    /// Create a buffer from an 8-bit RGB image.
    pub fn from_rgb_image(img: RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: 3,
            pixels: img.into_raw(),
        }
    }

    /// Create a buffer from an 8-bit grayscale image.
    pub fn from_gray_image(img: GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: 1,
            pixels: img.into_raw(),
        }
    }

    /// Create a buffer from any decoded image.
    ///
    /// 8-bit gray, RGB and RGBA images keep their layout; everything else
    /// is converted to RGBA.
    pub fn from_dynamic_image(img: DynamicImage) -> Self {
        match img {
            DynamicImage::ImageLuma8(gray) => Self::from_gray_image(gray),
            DynamicImage::ImageRgb8(rgb) => Self::from_rgb_image(rgb),
            DynamicImage::ImageRgba8(rgba) => Self::from_rgba_image(rgba),
            other => Self::from_rgba_image(other.to_rgba8()),
        }
    }

    /// Convert to a `DynamicImage` for use with the `image` crate.
    ///
    /// Returns `None` when the buffer violates its invariants.
    pub fn to_dynamic_image(&self) -> Option<DynamicImage> {
        let pixels = self.pixels.clone();
        match self.channels {
            1 => GrayImage::from_raw(self.width, self.height, pixels).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(self.width, self.height, pixels).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(self.width, self.height, pixels).map(DynamicImage::ImageRgba8),
            _ => None,
        }
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Get the `(width, height)` pair.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

/// Byte length of a `width x height x channels` buffer, or `None` on overflow.
pub(crate) fn expected_len(width: u32, height: u32, channels: u8) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(channels as usize)
}
