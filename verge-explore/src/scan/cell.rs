use serde::Serialize;

use verge_constraints::Ledger;

/// One evaluated grid cell: axis values, the margin ledger, and the model
/// output (absent when the evaluator failed).
#[derive(Debug, Clone, Serialize)]
pub struct CellRecord<O> {
    pub x: f64,
    pub y: f64,
    pub ledger: Ledger,
    #[serde(skip)]
    pub output: Option<O>,
    /// Evaluator failure message; such a cell is recorded as `Fail`.
    pub note: Option<String>,
}

impl<O> CellRecord<O> {
    /// Whether the cell is feasible.
    #[must_use]
    pub fn feasible(&self) -> bool {
        self.ledger.verdict.passes()
    }
}
