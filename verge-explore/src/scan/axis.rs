use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One scan axis: `n` evenly spaced samples of `key` across `[lo, hi]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub key: String,
    pub lo: f64,
    pub hi: f64,
    pub n: usize,
}

impl Axis {
    pub fn new(key: impl Into<String>, lo: f64, hi: f64, n: usize) -> Self {
        Self {
            key: key.into(),
            lo,
            hi,
            n,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), GridError> {
        if self.key.is_empty() {
            return Err(GridError::EmptyAxisKey);
        }
        if !self.lo.is_finite() || !self.hi.is_finite() || self.lo >= self.hi {
            return Err(GridError::InvalidAxisRange {
                key: self.key.clone(),
                lo: self.lo,
                hi: self.hi,
            });
        }
        if self.n < 2 {
            return Err(GridError::TooFewSamples {
                key: self.key.clone(),
                n: self.n,
            });
        }
        Ok(())
    }

    /// Sample `i` of the axis. The endpoints land exactly on `lo` and `hi`.
    #[must_use]
    pub fn value(&self, i: usize) -> f64 {
        if i + 1 == self.n {
            self.hi
        } else {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 / (self.n - 1) as f64;
            self.lo + (self.hi - self.lo) * t
        }
    }
}

/// A two-axis rectangular grid over a base input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub x: Axis,
    pub y: Axis,
}

impl GridSpec {
    #[must_use]
    pub fn new(x: Axis, y: Axis) -> Self {
        Self { x, y }
    }

    pub(crate) fn validate(&self) -> Result<(), GridError> {
        self.x.validate()?;
        self.y.validate()?;
        if self.x.key == self.y.key {
            return Err(GridError::DuplicateAxisKey {
                key: self.x.key.clone(),
            });
        }
        Ok(())
    }
}

/// Grid declaration errors.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("axis key must not be empty")]
    EmptyAxisKey,

    #[error("axis {key:?} has invalid range [{lo}, {hi}]")]
    InvalidAxisRange { key: String, lo: f64, hi: f64 },

    #[error("axis {key:?} needs at least 2 samples, got {n}")]
    TooFewSamples { key: String, n: usize },

    #[error("both axes sweep the same key {key:?}")]
    DuplicateAxisKey { key: String },
}
