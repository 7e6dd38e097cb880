use serde::{Deserialize, Serialize};

/// A desired value for one evaluator output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Output key the residual is measured against.
    pub key: String,
    /// Desired value; the residual is `value - output[key]`.
    pub value: f64,
}

impl Target {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// A box-bounded iteration variable overriding one base-input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub lo: f64,
    pub hi: f64,
    pub initial: f64,
}

impl Variable {
    pub fn new(name: impl Into<String>, lo: f64, hi: f64, initial: f64) -> Self {
        Self {
            name: name.into(),
            lo,
            hi,
            initial,
        }
    }
}

/// One rung of a continuation ladder: target overrides and an optional
/// stage tolerance.
///
/// Overrides replace matching base targets by key; each stage warm-starts
/// from the previous stage's point. Stages exist as a robustness aid for
/// targets only reachable through easier intermediates, not as a different
/// solve semantics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stage {
    pub targets: Vec<Target>,
    pub tol: Option<f64>,
}

impl Stage {
    #[must_use]
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets, tol: None }
    }

    #[must_use]
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = Some(tol);
        self
    }
}
