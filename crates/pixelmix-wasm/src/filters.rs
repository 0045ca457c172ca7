//! WASM bindings for the filter catalog.
//!
//! The catalog is serialized as-is, so a front end can build its controls
//! from the same schema the core validates against.

use crate::transform::to_js_error;
use wasm_bindgen::prelude::*;

/// The full filter catalog as an array of
/// `{ name, parameters: [{ name, type, ...domain, coercion }] }` objects.
///
/// # Example (TypeScript)
///
/// ```typescript
/// for (const filter of filter_catalog()) {
///   console.log(filter.name, filter.parameters.map((p) => p.name));
/// }
/// ```
#[wasm_bindgen]
pub fn filter_catalog() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(pixelmix_core::filter_catalog()).map_err(to_js_error)
}

/// Names of every catalog filter, in menu order.
#[wasm_bindgen]
pub fn filter_names() -> js_sys::Array {
    pixelmix_core::filter_names()
        .into_iter()
        .map(JsValue::from_str)
        .collect()
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_filter_names() {
        let names = filter_names();
        assert_eq!(names.length(), 12);
        assert_eq!(names.get(0).as_string().unwrap(), "noFilter");
    }

    #[wasm_bindgen_test]
    fn test_filter_catalog_is_array() {
        let catalog = filter_catalog().unwrap();
        assert!(js_sys::Array::is_array(&catalog));
        let first = js_sys::Array::from(&catalog).get(1);
        let name = js_sys::Reflect::get(&first, &JsValue::from_str("name")).unwrap();
        assert_eq!(name.as_string().unwrap(), "bilateralFilter");
    }
}
