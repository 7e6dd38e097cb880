use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Comparison sense of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    /// Value must stay at or below the limit.
    #[serde(rename = "<=")]
    LessEq,
    /// Value must stay at or above the limit.
    #[serde(rename = ">=")]
    GreaterEq,
    /// Value must equal the limit. Boolean feasibility flags from the
    /// evaluator (e.g. "stack fits") are declared this way with limit 1.0;
    /// they get no special handling.
    #[serde(rename = "==")]
    Equal,
}

/// Enforcement tier of a constraint.
///
/// Only `Hard` constraints can fail a point. The `Ord` impl ranks tiers by
/// decreasing strictness, so a policy downgrade moves strictly upward in
/// the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Hard,
    Diagnostic,
    Ignored,
}

fn default_scale() -> f64 {
    1.0
}

/// A declared feasibility constraint on one evaluator output.
///
/// The signed margin against an output record is
/// `sign * (limit - value) / scale`, with `sign = +1` for `<=` and `-1`
/// for `>=`; `==` yields `-|value - limit| / scale`. Positive margin means
/// satisfied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSpec {
    pub id: String,
    pub tier: Tier,
    pub sense: Sense,
    pub limit: f64,
    pub output_key: String,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

/// Errors produced when validating a [`ConstraintSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("constraint id must be non-empty")]
    EmptyId,

    #[error("constraint {id:?} has an empty output key")]
    EmptyOutputKey { id: String },

    #[error("constraint {id:?} has a non-finite limit")]
    NonFiniteLimit { id: String },

    #[error("constraint {id:?} needs a finite positive scale")]
    InvalidScale { id: String },

    #[error("duplicate constraint id {id:?}")]
    DuplicateId { id: String },
}

impl ConstraintSpec {
    /// Validates the declaration.
    ///
    /// # Errors
    ///
    /// Returns an error if the id or output key is empty, the limit is not
    /// finite, or the scale is not finite and positive.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.id.is_empty() {
            return Err(SpecError::EmptyId);
        }
        if self.output_key.is_empty() {
            return Err(SpecError::EmptyOutputKey {
                id: self.id.clone(),
            });
        }
        if !self.limit.is_finite() {
            return Err(SpecError::NonFiniteLimit {
                id: self.id.clone(),
            });
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(SpecError::InvalidScale {
                id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Signed margin of a value against this constraint.
    #[must_use]
    pub fn margin_of(&self, value: f64) -> f64 {
        match self.sense {
            Sense::LessEq => (self.limit - value) / self.scale,
            Sense::GreaterEq => (value - self.limit) / self.scale,
            Sense::Equal => -(value - self.limit).abs() / self.scale,
        }
    }
}
