//! The closed set of filters and the parameter schema each one declares.
//!
//! The schema doubles as UI metadata: a front end can build its sliders,
//! toggles and dropdowns straight from [`filter_catalog`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Result, TransformError};

/// Domain and default of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ParamKind {
    /// A number on the grid `min, min + step, ..., max`.
    Number {
        min: f64,
        max: f64,
        step: f64,
        default: f64,
    },
    /// A toggle.
    Boolean { default: bool },
    /// One of a fixed, ordered set of strings.
    Select {
        options: &'static [&'static str],
        default: &'static str,
    },
}

/// How a number is adjusted before the step-grid check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Coercion {
    /// Use the value as given.
    #[default]
    Exact,
    /// Round down to an integer and force it odd: `max(1, floor(v) | 1)`.
    ForceOdd,
}

impl Coercion {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Coercion::Exact => value,
            Coercion::ForceOdd => ((value.floor() as i64) | 1).max(1) as f64,
        }
    }
}

/// Schema of one filter parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: ParamKind,
    pub coercion: Coercion,
}

/// Schema of one filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub name: &'static str,
    pub parameters: &'static [ParameterSpec],
}

impl FilterSpec {
    /// Look up a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&'static ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

const fn number(name: &'static str, min: f64, max: f64, step: f64, default: f64) -> ParameterSpec {
    ParameterSpec {
        name,
        kind: ParamKind::Number {
            min,
            max,
            step,
            default,
        },
        coercion: Coercion::Exact,
    }
}

const fn odd_kernel(name: &'static str) -> ParameterSpec {
    ParameterSpec {
        coercion: Coercion::ForceOdd,
        ..number(name, 1.0, 31.0, 2.0, 3.0)
    }
}

const APERTURES: &[&str] = &["1", "3", "5", "7"];

const fn aperture(name: &'static str) -> ParameterSpec {
    ParameterSpec {
        name,
        kind: ParamKind::Select {
            options: APERTURES,
            default: "3",
        },
        coercion: Coercion::Exact,
    }
}

const KSIZE_XY: &[ParameterSpec] = &[
    number("ksizeX", 1.0, 31.0, 2.0, 3.0),
    number("ksizeY", 1.0, 31.0, 2.0, 3.0),
];

/// Every filter, in menu order.
pub static FILTER_CATALOG: [FilterSpec; 12] = [
    FilterSpec {
        name: "noFilter",
        parameters: &[],
    },
    FilterSpec {
        name: "bilateralFilter",
        parameters: &[
            number("d", 1.0, 15.0, 1.0, 5.0),
            number("sigmaColor", 0.0, 255.0, 1.0, 75.0),
            number("sigmaSpace", 0.0, 255.0, 1.0, 75.0),
        ],
    },
    FilterSpec {
        name: "blur",
        parameters: KSIZE_XY,
    },
    FilterSpec {
        name: "boxFilter",
        parameters: KSIZE_XY,
    },
    FilterSpec {
        name: "dilate",
        parameters: KSIZE_XY,
    },
    FilterSpec {
        name: "erode",
        parameters: KSIZE_XY,
    },
    FilterSpec {
        name: "GaussianBlur",
        parameters: &[
            odd_kernel("ksizeX"),
            odd_kernel("ksizeY"),
            number("sigmaX", 0.0, 10.0, 0.1, 0.0),
            number("sigmaY", 0.0, 10.0, 0.1, 0.0),
        ],
    },
    FilterSpec {
        name: "medianBlur",
        parameters: &[number("ksize", 1.0, 31.0, 2.0, 3.0)],
    },
    FilterSpec {
        name: "Sobel",
        parameters: &[
            number("dx", 0.0, 2.0, 1.0, 1.0),
            number("dy", 0.0, 2.0, 1.0, 0.0),
            aperture("ksize"),
        ],
    },
    FilterSpec {
        name: "Scharr",
        parameters: &[
            number("dx", 0.0, 1.0, 1.0, 1.0),
            number("dy", 0.0, 1.0, 1.0, 0.0),
        ],
    },
    FilterSpec {
        name: "sepFilter2D",
        parameters: &[aperture("kernelX"), aperture("kernelY")],
    },
    FilterSpec {
        name: "Laplacian",
        parameters: &[aperture("ksize")],
    },
];

/// The full filter catalog.
pub fn filter_catalog() -> &'static [FilterSpec] {
    &FILTER_CATALOG
}

/// Catalog keys as a closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    NoFilter,
    Bilateral,
    Blur,
    BoxFilter,
    Dilate,
    Erode,
    GaussianBlur,
    MedianBlur,
    Sobel,
    Scharr,
    SepFilter2D,
    Laplacian,
}

impl FilterKind {
    /// Every filter kind, in catalog order.
    pub const ALL: [FilterKind; 12] = [
        FilterKind::NoFilter,
        FilterKind::Bilateral,
        FilterKind::Blur,
        FilterKind::BoxFilter,
        FilterKind::Dilate,
        FilterKind::Erode,
        FilterKind::GaussianBlur,
        FilterKind::MedianBlur,
        FilterKind::Sobel,
        FilterKind::Scharr,
        FilterKind::SepFilter2D,
        FilterKind::Laplacian,
    ];

    /// The schema for this filter.
    pub fn spec(self) -> &'static FilterSpec {
        &FILTER_CATALOG[self as usize]
    }

    /// The catalog name, e.g. `"GaussianBlur"`.
    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        FilterKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| TransformError::UnsupportedFilter(s.to_string()))
    }
}
