//! Filter requests and validation of their parameters against the catalog.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::catalog::{FilterSpec, ParamKind, ParameterSpec};
use crate::error::{Result, TransformError};

/// A raw parameter value as sent by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Boolean(b) => write!(f, "{b}"),
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Number(v as f64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Boolean(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// A single-image filter request.
///
/// Parameters the caller leaves out take their catalog default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    pub filter_name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
    #[serde(default)]
    pub grayscale_requested: bool,
}

impl FilterRequest {
    pub fn new(filter_name: impl Into<String>) -> Self {
        Self {
            filter_name: filter_name.into(),
            ..Self::default()
        }
    }

    /// Set one parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_grayscale(mut self, grayscale_requested: bool) -> Self {
        self.grayscale_requested = grayscale_requested;
        self
    }
}

/// A parameter value after validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Resolved {
    Number(f64),
    Boolean(bool),
    Select(&'static str),
}

/// Every parameter of one filter, validated and defaulted.
#[derive(Debug)]
pub(crate) struct ResolvedParams {
    filter: &'static str,
    values: Vec<(&'static str, Resolved)>,
}

impl ResolvedParams {
    fn get(&self, name: &str) -> Result<Resolved> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
            .ok_or_else(|| {
                TransformError::InternalProcessingFailure(format!(
                    "{} has no parameter '{name}'",
                    self.filter
                ))
            })
    }

    pub(crate) fn number(&self, name: &str) -> Result<f64> {
        match self.get(name)? {
            Resolved::Number(v) => Ok(v),
            other => Err(self.wrong_kind(name, other)),
        }
    }

    /// A number that validation has already restricted to a non-negative
    /// integer grid.
    pub(crate) fn count(&self, name: &str) -> Result<u32> {
        Ok(self.number(name)?.round() as u32)
    }

    // No catalog filter takes a toggle yet.
    #[allow(dead_code)]
    pub(crate) fn boolean(&self, name: &str) -> Result<bool> {
        match self.get(name)? {
            Resolved::Boolean(v) => Ok(v),
            other => Err(self.wrong_kind(name, other)),
        }
    }

    pub(crate) fn select(&self, name: &str) -> Result<&'static str> {
        match self.get(name)? {
            Resolved::Select(v) => Ok(v),
            other => Err(self.wrong_kind(name, other)),
        }
    }

    /// A select whose options are integers, such as an aperture size.
    pub(crate) fn select_count(&self, name: &str) -> Result<u32> {
        let option = self.select(name)?;
        option
            .parse()
            .map_err(|_| TransformError::invalid_parameter(name, option, "expected an integer option"))
    }

    fn wrong_kind(&self, name: &str, found: Resolved) -> TransformError {
        TransformError::InternalProcessingFailure(format!(
            "{}.{name} resolved to unexpected {found:?}",
            self.filter
        ))
    }
}

/// Validate `params` against `spec`, filling defaults for anything omitted.
///
/// Numbers are checked in three steps: range on the raw value, then the
/// parameter's coercion, then the step grid on the coerced value.
///
/// # Errors
///
/// Returns `TransformError::InvalidParameter` for unknown names, type
/// mismatches, out-of-range values, off-grid values and unknown options.
pub(crate) fn resolve(spec: &FilterSpec, params: &BTreeMap<String, ParamValue>) -> Result<ResolvedParams> {
    if let Some((name, value)) = params.iter().find(|(name, _)| spec.parameter(name).is_none()) {
        return Err(TransformError::invalid_parameter(
            name.as_str(),
            value,
            format!("{} has no such parameter", spec.name),
        ));
    }

    let values = spec
        .parameters
        .iter()
        .map(|param| {
            let resolved = match params.get(param.name) {
                Some(value) => resolve_one(param, value)?,
                None => default_of(param),
            };
            Ok((param.name, resolved))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ResolvedParams {
        filter: spec.name,
        values,
    })
}

fn default_of(param: &ParameterSpec) -> Resolved {
    match param.kind {
        ParamKind::Number { default, .. } => Resolved::Number(param.coercion.apply(default)),
        ParamKind::Boolean { default } => Resolved::Boolean(default),
        ParamKind::Select { default, .. } => Resolved::Select(default),
    }
}

fn resolve_one(param: &ParameterSpec, value: &ParamValue) -> Result<Resolved> {
    let invalid = |reason: String| TransformError::invalid_parameter(param.name, value, reason);

    match (param.kind, value) {
        (
            ParamKind::Number {
                min, max, step, ..
            },
            ParamValue::Number(raw),
        ) => {
            let raw = *raw;
            if !raw.is_finite() || raw < min || raw > max {
                return Err(invalid(format!("must lie in [{min}, {max}]")));
            }
            let v = param.coercion.apply(raw);
            if !on_grid(v, min, step) {
                return Err(invalid(format!("must be {min} plus a multiple of {step}")));
            }
            Ok(Resolved::Number(v))
        }
        (ParamKind::Boolean { .. }, ParamValue::Boolean(b)) => Ok(Resolved::Boolean(*b)),
        (ParamKind::Select { options, .. }, ParamValue::Text(s)) => options
            .iter()
            .copied()
            .find(|option| *option == s.as_str())
            .map(Resolved::Select)
            .ok_or_else(|| invalid(format!("must be one of {options:?}"))),
        // Dropdowns whose options are numbers may arrive as numbers.
        (ParamKind::Select { options, .. }, ParamValue::Number(n)) => {
            let text = n.to_string();
            options
                .iter()
                .copied()
                .find(|option| *option == text)
                .map(Resolved::Select)
                .ok_or_else(|| invalid(format!("must be one of {options:?}")))
        }
        (kind, _) => Err(invalid(format!("expected {}", kind_name(kind)))),
    }
}

fn kind_name(kind: ParamKind) -> &'static str {
    match kind {
        ParamKind::Number { .. } => "a number",
        ParamKind::Boolean { .. } => "a boolean",
        ParamKind::Select { .. } => "one of the listed options",
    }
}

fn on_grid(v: f64, min: f64, step: f64) -> bool {
    if step <= 0.0 {
        return true;
    }
    let steps = (v - min) / step;
    (steps - steps.round()).abs() < 1e-6
}
