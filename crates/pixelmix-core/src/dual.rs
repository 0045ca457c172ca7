//! Pixel-wise operators over two equally sized images.
//!
//! ## Operators
//!
//! | kind | result (per channel, 8-bit) |
//! |------|-----------------------------|
//! | add | `saturate(a + b)` |
//! | subtract | `saturate(a - b)`, floored at 0 |
//! | and / or / xor | bitwise |
//! | not | `!a`, `b` ignored |
//! | blend | `saturate(round(alpha * a + beta * b))` |

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};
use crate::scope::{MatId, Scope};

/// The dual-image operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Subtract,
    And,
    Or,
    Xor,
    Not,
    Blend,
}

impl OperationKind {
    /// Every operator, in menu order.
    pub const ALL: [OperationKind; 7] = [
        OperationKind::Add,
        OperationKind::Subtract,
        OperationKind::And,
        OperationKind::Or,
        OperationKind::Xor,
        OperationKind::Not,
        OperationKind::Blend,
    ];

    /// The lowercase name used in requests.
    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Subtract => "subtract",
            OperationKind::And => "and",
            OperationKind::Or => "or",
            OperationKind::Xor => "xor",
            OperationKind::Not => "not",
            OperationKind::Blend => "blend",
        }
    }

    /// Whether this is one of the bitwise operators.
    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            OperationKind::And | OperationKind::Or | OperationKind::Xor | OperationKind::Not
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperationKind {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| TransformError::UnsupportedOperation(s.to_string()))
    }
}

fn default_weight() -> f64 {
    0.5
}

/// A dual-image request as sent by the UI.
///
/// `alpha` and `beta` are only read for [`OperationKind::Blend`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    pub kind: OperationKind,
    #[serde(default)]
    pub grayscale_requested: bool,
    #[serde(default = "default_weight")]
    pub alpha: f64,
    #[serde(default = "default_weight")]
    pub beta: f64,
}

impl Default for OperationRequest {
    fn default() -> Self {
        Self::new(OperationKind::Add)
    }
}

impl OperationRequest {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            grayscale_requested: false,
            alpha: default_weight(),
            beta: default_weight(),
        }
    }

    /// A blend request with the given weights.
    pub fn blend(alpha: f64, beta: f64) -> Self {
        Self {
            alpha,
            beta,
            ..Self::new(OperationKind::Blend)
        }
    }

    pub fn with_grayscale(mut self, grayscale_requested: bool) -> Self {
        self.grayscale_requested = grayscale_requested;
        self
    }

    /// Validate the request into an executable operator.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidParameter` if a blend weight is not a
    /// finite value in [0, 1].
    pub fn validate(&self) -> Result<DualOp> {
        Ok(match self.kind {
            OperationKind::Add => DualOp::Add,
            OperationKind::Subtract => DualOp::Subtract,
            OperationKind::And => DualOp::And,
            OperationKind::Or => DualOp::Or,
            OperationKind::Xor => DualOp::Xor,
            OperationKind::Not => DualOp::Not,
            OperationKind::Blend => DualOp::Blend {
                alpha: check_weight("alpha", self.alpha)?,
                beta: check_weight("beta", self.beta)?,
            },
        })
    }
}

fn check_weight(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(TransformError::invalid_parameter(
            name,
            value,
            "must be within [0, 1]",
        ))
    }
}

/// A validated dual-image operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DualOp {
    Add,
    Subtract,
    And,
    Or,
    Xor,
    Not,
    Blend { alpha: f64, beta: f64 },
}

impl DualOp {
    pub fn kind(&self) -> OperationKind {
        match self {
            DualOp::Add => OperationKind::Add,
            DualOp::Subtract => OperationKind::Subtract,
            DualOp::And => OperationKind::And,
            DualOp::Or => OperationKind::Or,
            DualOp::Xor => OperationKind::Xor,
            DualOp::Not => OperationKind::Not,
            DualOp::Blend { .. } => OperationKind::Blend,
        }
    }

    #[inline]
    fn combine(&self, a: u8, b: u8) -> u8 {
        match *self {
            DualOp::Add => a.saturating_add(b),
            DualOp::Subtract => a.saturating_sub(b),
            DualOp::And => a & b,
            DualOp::Or => a | b,
            DualOp::Xor => a ^ b,
            DualOp::Not => !a,
            DualOp::Blend { alpha, beta } => {
                (alpha * a as f64 + beta * b as f64).round().clamp(0.0, 255.0) as u8
            }
        }
    }

    /// Run the operator on two matrices of identical shape, writing into a
    /// freshly allocated matrix of the same shape.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidInput` if the operands differ in size,
    /// or in channel count for any operator other than `Not`.
    pub fn execute(&self, scope: &mut Scope, a: MatId, b: MatId) -> Result<MatId> {
        {
            let (ma, mb) = (scope.mat(a)?, scope.mat(b)?);
            if (ma.rows(), ma.cols()) != (mb.rows(), mb.cols()) {
                return Err(TransformError::InvalidInput(format!(
                    "operands differ in size: {}x{} vs {}x{}",
                    ma.cols(),
                    ma.rows(),
                    mb.cols(),
                    mb.rows()
                )));
            }
            if *self != DualOp::Not && ma.channels() != mb.channels() {
                return Err(TransformError::InvalidInput(format!(
                    "operands differ in channels: {} vs {}",
                    ma.channels(),
                    mb.channels()
                )));
            }
            debug!(
                "{} on {}x{}x{}",
                self.kind(),
                ma.cols(),
                ma.rows(),
                ma.channels()
            );
        }

        let dst = scope.alloc_like(a)?;
        scope.with_output(dst, |scope, out| {
            let out = out.as_u8_mut()?;
            let lhs = scope.mat(a)?.as_u8()?;
            if *self == DualOp::Not {
                for (o, &x) in out.iter_mut().zip(lhs) {
                    *o = !x;
                }
            } else {
                let rhs = scope.mat(b)?.as_u8()?;
                for ((o, &x), &y) in out.iter_mut().zip(lhs).zip(rhs) {
                    *o = self.combine(x, y);
                }
            }
            Ok(())
        })?;
        Ok(dst)
    }
}
