//! PixelMix WASM - WebAssembly bindings for PixelMix
//!
//! This crate exposes the pixelmix-core transforms to JavaScript/TypeScript.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrappers for rasters and transform results
//! - `transform` - `apply_dual_op` and `apply_filter`
//! - `filters` - The filter catalog for building UI controls
//! - `crop` - Matching two images by cropping
//!
//! # Usage
//!
//! ```typescript
//! import init, { apply_dual_op, JsRasterBuffer } from '@pixelmix/wasm';
//!
//! await init();
//!
//! const a = new JsRasterBuffer(width, height, 4, pixelsA);
//! const b = new JsRasterBuffer(width, height, 4, pixelsB);
//! const result = apply_dual_op(a, b, { kind: 'xor', grayscaleRequested: true }, undefined);
//! console.log(`${result.width}x${result.height}, ${result.channels} channel(s)`);
//! ```

use wasm_bindgen::prelude::*;

mod crop;
mod filters;
mod transform;
mod types;

pub use crop::{apply_crop, optimal_crop_size};
pub use filters::{filter_catalog, filter_names};
pub use transform::{apply_dual_op, apply_filter};
pub use types::{JsRasterBuffer, JsTransformResult};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
