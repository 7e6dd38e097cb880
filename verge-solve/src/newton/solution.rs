use serde::Serialize;

use verge_core::Snapshot;

/// Why a solve stopped without reaching its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Reached the iteration cap without converging.
    MaxIters,
    /// The line search found no step that reduced the residual.
    NoDescent,
    /// The finite-difference Jacobian could not be inverted.
    SingularJacobian,
    /// A targeted output was `NaN`; never coerced, always a hard failure.
    NanInOutputs,
}

/// Final solver status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The residual norm dropped below tolerance.
    Converged,
    /// The targets cannot be bracketed inside the declared box; the
    /// reported point sits at the nearest bound and `residual_norm` is
    /// still measured against the requested targets. A valid, auditable
    /// boundary result — not an error.
    Clamped,
    /// Stopped early by an observer decision.
    Stopped,
    /// The solve failed for the recorded reason.
    Failed(FailureKind),
}

impl Status {
    /// Whether the solve met its targets.
    #[must_use]
    pub fn converged(self) -> bool {
        matches!(self, Self::Converged)
    }

    /// Whether the solve ended pinned at the variable box.
    #[must_use]
    pub fn clamped(self) -> bool {
        matches!(self, Self::Clamped)
    }
}

/// One accepted iteration, kept for auditability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceStep {
    /// Continuation stage index (0 for a plain solve).
    pub stage: usize,
    /// Iteration counter within the stage (1-based).
    pub iter: usize,
    /// Variable values in natural units, in declaration order.
    pub x: Vec<f64>,
    /// Residual norm after the step.
    pub residual_norm: f64,
    /// Line-search halvings the step needed.
    pub backtracks: usize,
    /// Variables sitting exactly on a bound after projection.
    pub pinned: Vec<String>,
}

/// Outcome of one continuation stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub stage: usize,
    pub status: Status,
    pub iters: usize,
    /// Residual norm against this stage's own targets.
    pub residual_norm: f64,
}

/// The result of a bounded Newton solve.
#[derive(Debug, Clone)]
pub struct Solution<I, O> {
    pub status: Status,
    /// Final variable values in natural units, paired with their names in
    /// declaration order.
    pub x: Vec<(String, f64)>,
    /// Total accepted iterations across all stages.
    pub iters: usize,
    /// Residual norm against the requested (final-stage) targets.
    pub residual_norm: f64,
    /// Variables repeatedly pinned at a bound during the solve.
    pub clamped_on: Vec<String>,
    /// Snapshot at the reported point.
    pub snapshot: Snapshot<I, O>,
    /// Accepted iterations, in order.
    pub trace: Vec<TraceStep>,
    /// Per-stage outcomes, in ladder order.
    pub stages: Vec<StageReport>,
}
