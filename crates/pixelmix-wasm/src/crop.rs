//! WASM bindings for matching two images by cropping.

use crate::transform::to_js_error;
use crate::types::JsRasterBuffer;
use pixelmix_core::{CropRegion, RasterBuffer, Result as CoreResult};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Crop regions for a pair of images, one per operand.
#[derive(Debug, Serialize)]
struct CropPair {
    a: CropRegion,
    b: CropRegion,
}

fn crop_pair(a: &RasterBuffer, b: &RasterBuffer) -> CoreResult<CropPair> {
    let (a, b) = pixelmix_core::optimal_crop_size(a, b)?;
    Ok(CropPair { a, b })
}

/// Largest top-left-aligned rectangle both images share.
///
/// Returns `{ a: CropRegion, b: CropRegion }` with each region in percent of
/// its own image (`{ x, y, width, height }`, 0 to 100).
#[wasm_bindgen]
pub fn optimal_crop_size(a: &JsRasterBuffer, b: &JsRasterBuffer) -> Result<JsValue, JsValue> {
    let pair = crop_pair(&a.to_buffer(), &b.to_buffer()).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&pair).map_err(to_js_error)
}

/// Crop an image to a percent region such as one returned by
/// `optimal_crop_size`.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const { a: regionA, b: regionB } = optimal_crop_size(left, right);
/// const croppedLeft = apply_crop(left, regionA);
/// ```
#[wasm_bindgen]
pub fn apply_crop(image: &JsRasterBuffer, region: JsValue) -> Result<JsRasterBuffer, JsValue> {
    let region: CropRegion = serde_wasm_bindgen::from_value(region)
        .map_err(|e| to_js_error(format!("Invalid crop region: {}", e)))?;
    pixelmix_core::apply_crop(&image.to_buffer(), &region)
        .map(JsRasterBuffer::from_buffer)
        .map_err(to_js_error)
}
