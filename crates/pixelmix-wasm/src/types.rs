//! WASM-compatible wrapper types for raster data and transform results.
//!
//! These types wrap the core PixelMix types and handle the conversion
//! between Rust and JavaScript data representations.

use pixelmix_core::{FilterType, RasterBuffer, TransformResult};
use wasm_bindgen::prelude::*;

/// A raster image wrapper for JavaScript.
///
/// Pixels are row-major and interleaved with 1 (gray), 3 (RGB) or 4 (RGBA)
/// bytes per pixel. The layout is only checked when the image is handed to
/// a transform.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. `pixels()` copies it into a
/// `Uint8Array`. Call the generated `free()` to release the WASM side early.
#[wasm_bindgen]
pub struct JsRasterBuffer {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsRasterBuffer {
    /// Create a raster from dimensions, channel count and pixel data.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> JsRasterBuffer {
        JsRasterBuffer {
            width,
            height,
            channels,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Number of bytes in the pixel buffer.
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns the pixel data as a Uint8Array (copied).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsRasterBuffer {
    pub(crate) fn from_buffer(buffer: RasterBuffer) -> Self {
        Self {
            width: buffer.width,
            height: buffer.height,
            channels: buffer.channels,
            pixels: buffer.pixels,
        }
    }

    /// Copy into a core buffer without validating it; the transforms do
    /// that themselves and report `InvalidInput`.
    pub(crate) fn to_buffer(&self) -> RasterBuffer {
        RasterBuffer {
            width: self.width,
            height: self.height,
            channels: self.channels,
            pixels: self.pixels.clone(),
        }
    }
}

/// Output of `apply_dual_op` or `apply_filter`.
///
/// Carries both the raw pixels (for further chaining on the JS side) and the
/// encoded bytes ready for a `Blob`.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const result = apply_filter(image, { filterName: 'medianBlur', parameters: { ksize: 5 } });
/// const blob = new Blob([result.encoded()], { type: result.mime_type });
/// result.free();
/// ```
#[wasm_bindgen]
pub struct JsTransformResult {
    image: JsRasterBuffer,
    encoded: Vec<u8>,
    mime_type: &'static str,
}

#[wasm_bindgen]
impl JsTransformResult {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.image.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.image.height
    }

    #[wasm_bindgen(getter)]
    pub fn channels(&self) -> u8 {
        self.image.channels
    }

    /// MIME type of the encoded bytes (`image/png` or `image/jpeg`).
    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        self.mime_type.to_string()
    }

    /// Raw pixel data of the result (copied).
    pub fn pixels(&self) -> Vec<u8> {
        self.image.pixels()
    }

    /// Encoded image bytes (copied).
    pub fn encoded(&self) -> Vec<u8> {
        self.encoded.clone()
    }

    /// Take the raw result as a raster for chaining into another transform.
    pub fn into_raster(self) -> JsRasterBuffer {
        self.image
    }
}

impl JsTransformResult {
    pub(crate) fn from_result(result: TransformResult) -> Self {
        let mime_type = result.encoded.mime_type();
        Self {
            image: JsRasterBuffer::from_buffer(result.buffer),
            encoded: result.encoded.bytes,
            mime_type,
        }
    }
}

/// Convert a u8 filter type value to the core FilterType enum.
///
/// Values:
/// - 0 = Nearest
/// - 1 = Bilinear
/// - 2 = Lanczos3
///
/// Any other value defaults to Bilinear.
pub(crate) fn filter_from_u8(value: u8) -> FilterType {
    match value {
        0 => FilterType::Nearest,
        2 => FilterType::Lanczos3,
        _ => FilterType::Bilinear,
    }
}
