//! WASM bindings for the two transforms.
//!
//! Requests and options arrive as plain JS objects and are deserialized with
//! `serde-wasm-bindgen`. Operation kinds stay strings until they reach the
//! core parser, so an unknown kind reports `Unsupported operation` rather
//! than a deserialization error.

use std::fmt::Display;

use pixelmix_core::{
    apply_dual_op_with, apply_filter_with, EncodeFormat, FilterRequest, OperationKind,
    OperationRequest, TransformError, TransformOptions,
};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

use crate::types::{filter_from_u8, JsRasterBuffer, JsTransformResult};

/// Dual-operation request as sent from JS.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsOperationRequest {
    kind: String,
    #[serde(default)]
    grayscale_requested: bool,
    alpha: Option<f64>,
    beta: Option<f64>,
}

impl JsOperationRequest {
    fn into_request(self) -> Result<OperationRequest, TransformError> {
        let kind: OperationKind = self.kind.parse()?;
        let mut request = OperationRequest::new(kind).with_grayscale(self.grayscale_requested);
        if let Some(alpha) = self.alpha {
            request.alpha = alpha;
        }
        if let Some(beta) = self.beta {
            request.beta = beta;
        }
        Ok(request)
    }
}

/// Per-call options as sent from JS. `resizeFilter` uses the numeric codes
/// of [`filter_from_u8`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct JsTransformOptions {
    resize_filter: Option<u8>,
    encoding: Option<EncodeFormat>,
}

impl JsTransformOptions {
    fn into_options(self) -> TransformOptions {
        let mut options = TransformOptions::new();
        if let Some(code) = self.resize_filter {
            options = options.with_resize_filter(filter_from_u8(code));
        }
        if let Some(encoding) = self.encoding {
            options = options.with_encoding(encoding);
        }
        options
    }
}

/// Log an error to the browser console and turn it into a JS string.
pub(crate) fn to_js_error(err: impl Display) -> JsValue {
    let message = JsValue::from_str(&err.to_string());
    web_sys::console::error_1(&message);
    message
}

fn parse_options(options: JsValue) -> Result<TransformOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(TransformOptions::default());
    }
    let raw: JsTransformOptions = serde_wasm_bindgen::from_value(options)
        .map_err(|e| to_js_error(format!("Invalid options: {}", e)))?;
    Ok(raw.into_options())
}

/// Combine two images pixel by pixel.
///
/// # Arguments
///
/// * `a`, `b` - Operands; sizes and channel layouts may differ
/// * `request` - `{ kind, grayscaleRequested?, alpha?, beta? }` where `kind`
///   is one of `add`, `subtract`, `and`, `or`, `xor`, `not`, `blend`
/// * `options` - Optional `{ resizeFilter?: 0 | 1 | 2, encoding?: { format: 'png' } | { format: 'jpeg', quality } }`
///
/// # Example (TypeScript)
///
/// ```typescript
/// const result = apply_dual_op(a, b, { kind: 'blend', alpha: 0.7, beta: 0.3 }, undefined);
/// ```
///
/// # Errors
///
/// Returns the core error message as a string for invalid buffers, unknown
/// operations, out-of-range weights or allocation failures.
#[wasm_bindgen]
pub fn apply_dual_op(
    a: &JsRasterBuffer,
    b: &JsRasterBuffer,
    request: JsValue,
    options: JsValue,
) -> Result<JsTransformResult, JsValue> {
    let raw: JsOperationRequest = serde_wasm_bindgen::from_value(request)
        .map_err(|e| to_js_error(format!("Invalid operation request: {}", e)))?;
    let request = raw.into_request().map_err(to_js_error)?;
    let options = parse_options(options)?;

    apply_dual_op_with(&a.to_buffer(), &b.to_buffer(), &request, &options)
        .map(JsTransformResult::from_result)
        .map_err(to_js_error)
}

/// Apply one catalog filter to an image.
///
/// # Arguments
///
/// * `image` - Source image
/// * `request` - `{ filterName, parameters?, grayscaleRequested? }`
/// * `options` - Same shape as for `apply_dual_op`
///
/// # Example (TypeScript)
///
/// ```typescript
/// const result = apply_filter(image, {
///   filterName: 'GaussianBlur',
///   parameters: { ksizeX: 7, ksizeY: 7, sigmaX: 2 },
/// }, { encoding: { format: 'jpeg', quality: 85 } });
/// ```
#[wasm_bindgen]
pub fn apply_filter(
    image: &JsRasterBuffer,
    request: JsValue,
    options: JsValue,
) -> Result<JsTransformResult, JsValue> {
    let request: FilterRequest = serde_wasm_bindgen::from_value(request)
        .map_err(|e| to_js_error(format!("Invalid filter request: {}", e)))?;
    let options = parse_options(options)?;

    apply_filter_with(&image.to_buffer(), &request, &options)
        .map(JsTransformResult::from_result)
        .map_err(to_js_error)
}


/// WASM-specific tests that require JsValue.
///
/// These tests can only run on wasm32 targets. Use `wasm-pack test` to run these.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use serde::Serialize;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct TestRequest<'a> {
        kind: &'a str,
        grayscale_requested: bool,
    }

    fn to_js<T: Serialize>(value: &T) -> JsValue {
        serde_wasm_bindgen::to_value(value).unwrap()
    }

    fn rgb(width: u32, height: u32, value: u8) -> JsRasterBuffer {
        JsRasterBuffer::new(width, height, 3, vec![value; (width * height * 3) as usize])
    }

    #[wasm_bindgen_test]
    fn test_dual_op_add() {
        let request = to_js(&TestRequest {
            kind: "add",
            grayscale_requested: false,
        });
        let result = apply_dual_op(&rgb(8, 8, 100), &rgb(4, 4, 50), request, JsValue::UNDEFINED).unwrap();
        assert_eq!((result.width(), result.height()), (8, 8));
        assert!(result.pixels().iter().all(|&v| v == 150));
        assert_eq!(result.mime_type(), "image/png");
    }

    #[wasm_bindgen_test]
    fn test_dual_op_unknown_kind() {
        let request = to_js(&TestRequest {
            kind: "multiply",
            grayscale_requested: false,
        });
        let err = apply_dual_op(&rgb(2, 2, 0), &rgb(2, 2, 0), request, JsValue::NULL).unwrap_err();
        assert!(err.as_string().unwrap().contains("Unsupported operation"));
    }

    #[wasm_bindgen_test]
    fn test_filter_with_parameters() {
        let request = to_js(&median_request());
        let result = apply_filter(&rgb(16, 16, 90), request, JsValue::UNDEFINED).unwrap();
        assert_eq!(result.channels(), 3);
        assert!(result.pixels().iter().all(|&v| v == 90));
    }

    fn median_request() -> std::collections::BTreeMap<&'static str, &'static str> {
        [("filterName", "medianBlur")].into_iter().collect()
    }

    #[wasm_bindgen_test]
    fn test_filter_invalid_buffer() {
        let request = to_js(&median_request());
        let bad = JsRasterBuffer::new(4, 4, 3, vec![0u8; 10]);
        let err = apply_filter(&bad, request, JsValue::UNDEFINED).unwrap_err();
        assert!(err.as_string().unwrap().contains("Invalid input"));
    }
}
