//! Rectangular dominance scans over a two-axis slice of the design space.
//!
//! A scan sweeps two named input fields across a grid, evaluates the model
//! at every cell, and assesses each output against the constraint registry.
//! The result is a map of verdicts, dominant constraints, and margin
//! ledgers — the raw material for feasibility cartography.
//!
//! One cell's evaluator failure is that cell's `Fail` (with a note); it
//! never aborts the batch. Cancellation is checked between cells, so a
//! cancelled scan returns the contiguous prefix evaluated so far.

mod axis;
mod cell;
mod robustness;

pub use axis::{Axis, GridError, GridSpec};
pub use cell::CellRecord;
pub use robustness::Robustness;

use ndarray::Array2;
use thiserror::Error;
use tracing::{debug, trace};

use verge_constraints::{Ledger, PolicyLens, Registry};
use verge_core::{AdjustRecord, Model, Record};

use crate::CancelToken;
use crate::pareto::{Candidate, Objective, pareto_front};

/// Scan declaration errors. Per-cell evaluation failures are not errors;
/// they are recorded on the affected cell.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("axis key {key:?} is not a field of the base input")]
    UnknownAxisKey { key: String },
}

/// A completed (possibly cancelled) scan.
#[derive(Debug, Clone)]
pub struct ScanMap<O> {
    pub spec: GridSpec,
    /// Cells indexed `[x sample, y sample]`; `None` where cancellation
    /// stopped evaluation.
    pub cells: Array2<Option<CellRecord<O>>>,
    pub cancelled: bool,
}

impl<O> ScanMap<O> {
    #[must_use]
    pub fn cell(&self, ix: usize, iy: usize) -> Option<&CellRecord<O>> {
        self.cells.get([ix, iy]).and_then(Option::as_ref)
    }

    /// Number of evaluated cells.
    #[must_use]
    pub fn evaluated(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// The dominant constraint id per cell (`None` where unevaluated or
    /// where no hard constraint has a defined margin).
    #[must_use]
    pub fn dominance(&self) -> Array2<Option<String>> {
        self.cells
            .map(|cell| cell.as_ref().and_then(|c| c.ledger.dominant.clone()))
    }

    /// The robustness label for an evaluated cell, from the feasible
    /// fraction of its 3x3 neighborhood (evaluated cells only).
    #[must_use]
    pub fn robustness(&self, ix: usize, iy: usize) -> Option<Robustness> {
        self.cell(ix, iy)?;
        let (nx, ny) = self.cells.dim();
        let mut total = 0usize;
        let mut feasible = 0usize;
        for jx in ix.saturating_sub(1)..=(ix + 1).min(nx - 1) {
            for jy in iy.saturating_sub(1)..=(iy + 1).min(ny - 1) {
                if let Some(cell) = self.cell(jx, jy) {
                    total += 1;
                    if cell.feasible() {
                        feasible += 1;
                    }
                }
            }
        }
        #[allow(clippy::cast_precision_loss)]
        Some(Robustness::from_fraction(feasible as f64 / total as f64))
    }
}

impl<O: Record> ScanMap<O> {
    /// The Pareto front over evaluated feasible cells, as `(ix, iy)` grid
    /// indices in canonical scan order.
    #[must_use]
    pub fn pareto(&self, objectives: &[Objective]) -> Vec<(usize, usize)> {
        let mut positions = Vec::new();
        let mut candidates = Vec::new();
        for ((ix, iy), cell) in self.cells.indexed_iter() {
            let Some(cell) = cell else { continue };
            let values = objectives
                .iter()
                .map(|o| {
                    cell.output
                        .as_ref()
                        .and_then(|out| out.get(&o.key))
                        .unwrap_or(f64::NAN)
                })
                .collect();
            positions.push((ix, iy));
            candidates.push(Candidate::new(cell.ledger.verdict, values));
        }

        pareto_front(&candidates, objectives)
            .into_iter()
            .map(|i| positions[i])
            .collect()
    }
}

/// Sweeps the grid and assesses every cell.
///
/// Cells are evaluated in canonical order: the x axis outermost, the y
/// axis innermost, both ascending.
///
/// # Errors
///
/// Returns an error for an invalid grid declaration or an axis key that is
/// not a field of the base input.
pub fn scan<M>(
    model: &M,
    base: &M::Input,
    spec: &GridSpec,
    registry: &Registry,
    lens: &PolicyLens,
    cancel: &CancelToken,
) -> Result<ScanMap<M::Output>, ScanError>
where
    M: Model,
    M::Input: AdjustRecord,
    M::Output: Record,
{
    spec.validate()?;

    let mut cells = Array2::from_shape_simple_fn((spec.x.n, spec.y.n), || None);
    let mut cancelled = false;

    'sweep: for ix in 0..spec.x.n {
        for iy in 0..spec.y.n {
            if cancel.is_cancelled() {
                cancelled = true;
                break 'sweep;
            }

            let xv = spec.x.value(ix);
            let yv = spec.y.value(iy);
            let mut input = base.clone();
            input.set(&spec.x.key, xv).map_err(|_| {
                ScanError::UnknownAxisKey {
                    key: spec.x.key.clone(),
                }
            })?;
            input.set(&spec.y.key, yv).map_err(|_| {
                ScanError::UnknownAxisKey {
                    key: spec.y.key.clone(),
                }
            })?;

            let (ledger, output, note) = match model.call(&input) {
                Ok(out) => (registry.assess(&out, lens), Some(out), None),
                Err(e) => (Ledger::evaluation_failure(), None, Some(e.to_string())),
            };
            trace!(ix, iy, verdict = ?ledger.verdict, "scanned cell");
            cells[[ix, iy]] = Some(CellRecord {
                x: xv,
                y: yv,
                ledger,
                output,
                note,
            });
        }
        debug!(row = ix, "scan row complete");
    }

    if cancelled {
        debug!(evaluated = cells.iter().filter(|c| c.is_some()).count(), "scan cancelled");
    }

    Ok(ScanMap {
        spec: spec.clone(),
        cells,
        cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;
    use std::convert::Infallible;

    use verge_constraints::{ConstraintSpec, Sense, Tier, Verdict};
    use verge_core::FieldSet;

    use crate::pareto::Direction;

    /// Synthetic stand-in for a physics evaluator: `total = px + py`,
    /// `cost = px`.
    struct Summing;

    impl Model for Summing {
        type Input = FieldSet;
        type Output = FieldSet;
        type Error = Infallible;

        fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
            let px = input.get("px").unwrap_or(f64::NAN);
            let py = input.get("py").unwrap_or(f64::NAN);
            Ok(FieldSet::from_pairs([("total", px + py), ("cost", px)]).expect("valid"))
        }
    }

    /// Counts calls and trips a cancel token once the budget is spent.
    struct CancelAfter {
        calls: Cell<usize>,
        budget: usize,
        token: CancelToken,
    }

    impl Model for CancelAfter {
        type Input = FieldSet;
        type Output = FieldSet;
        type Error = Infallible;

        fn call(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
            self.calls.set(self.calls.get() + 1);
            if self.calls.get() >= self.budget {
                self.token.cancel();
            }
            Ok(FieldSet::from_pairs([("total", 0.0)]).expect("valid"))
        }
    }

    /// Fails for `px >= 2`, succeeds elsewhere.
    struct Patchy;

    #[derive(Debug, thiserror::Error)]
    #[error("evaluation diverged")]
    struct Diverged;

    impl Model for Patchy {
        type Input = FieldSet;
        type Output = FieldSet;
        type Error = Diverged;

        fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
            let px = input.get("px").unwrap_or(f64::NAN);
            if px >= 2.0 {
                return Err(Diverged);
            }
            Ok(FieldSet::from_pairs([("total", px)]).expect("valid"))
        }
    }

    fn base() -> FieldSet {
        FieldSet::from_pairs([("px", 0.0), ("py", 0.0)]).expect("valid")
    }

    fn total_cap(limit: f64) -> Registry {
        Registry::new(vec![ConstraintSpec {
            id: "total_cap".to_string(),
            tier: Tier::Hard,
            sense: Sense::LessEq,
            limit,
            output_key: "total".to_string(),
            scale: 1.0,
        }])
        .expect("valid registry")
    }

    fn grid(n: usize) -> GridSpec {
        GridSpec::new(Axis::new("px", 0.0, 3.0, n), Axis::new("py", 0.0, 3.0, n))
    }

    #[test]
    fn cells_follow_canonical_order_and_verdicts() {
        let map = scan(
            &Summing,
            &base(),
            &grid(4),
            &total_cap(3.0),
            &PolicyLens::new(),
            &CancelToken::new(),
        )
        .expect("valid scan");

        assert!(!map.cancelled);
        assert_eq!(map.evaluated(), 16);

        // px + py <= 3 passes; the far corner fails on total_cap.
        let near = map.cell(0, 0).expect("evaluated");
        assert_eq!(near.ledger.verdict, Verdict::Pass);
        let far = map.cell(3, 3).expect("evaluated");
        assert_eq!(far.ledger.verdict, Verdict::Fail);
        assert_eq!(far.ledger.dominant.as_deref(), Some("total_cap"));

        let dominance = map.dominance();
        assert_eq!(dominance[[3, 3]].as_deref(), Some("total_cap"));
    }

    #[test]
    fn cancellation_keeps_a_contiguous_prefix() {
        let token = CancelToken::new();
        let model = CancelAfter {
            calls: Cell::new(0),
            budget: 7,
            token: token.clone(),
        };

        let map = scan(
            &model,
            &base(),
            &grid(4),
            &total_cap(3.0),
            &PolicyLens::new(),
            &token,
        )
        .expect("valid scan");

        assert!(map.cancelled);
        assert_eq!(map.evaluated(), 7);

        // Evaluated cells form a prefix of the canonical order.
        let mut seen_gap = false;
        for cell in &map.cells {
            if cell.is_none() {
                seen_gap = true;
            } else {
                assert!(!seen_gap, "evaluated cell after a gap");
            }
        }
    }

    #[test]
    fn a_failing_cell_never_aborts_the_batch() {
        let map = scan(
            &Patchy,
            &base(),
            &grid(4),
            &total_cap(10.0),
            &PolicyLens::new(),
            &CancelToken::new(),
        )
        .expect("valid scan");

        assert_eq!(map.evaluated(), 16);

        let good = map.cell(0, 0).expect("evaluated");
        assert!(good.feasible());
        assert!(good.note.is_none());

        // px = 3 at ix = 3 diverges.
        let bad = map.cell(3, 0).expect("evaluated");
        assert_eq!(bad.ledger.verdict, Verdict::Fail);
        assert_eq!(bad.note.as_deref(), Some("evaluation diverged"));
        assert!(bad.output.is_none());
    }

    #[test]
    fn robustness_separates_the_interior_from_the_frontier() {
        let map = scan(
            &Summing,
            &base(),
            &grid(4),
            &total_cap(3.0),
            &PolicyLens::new(),
            &CancelToken::new(),
        )
        .expect("valid scan");

        // Deep in the feasible region every neighbor passes.
        assert_eq!(map.robustness(0, 0), Some(Robustness::Robust));
        // The far corner's whole neighborhood is infeasible.
        assert_eq!(map.robustness(3, 3), Some(Robustness::KnifeEdge));
    }

    #[test]
    fn pareto_over_the_scan_uses_feasible_cells_only() {
        let map = scan(
            &Summing,
            &base(),
            &grid(4),
            &total_cap(3.0),
            &PolicyLens::new(),
            &CancelToken::new(),
        )
        .expect("valid scan");

        // Minimizing cost = px while maximizing total = px + py: for each
        // feasible px the best cell has the largest feasible py.
        let front = map.pareto(&[
            Objective::new("cost", Direction::Minimize),
            Objective::new("total", Direction::Maximize),
        ]);

        assert!(!front.is_empty());
        assert!(front.contains(&(0, 3)));
        for (ix, iy) in front {
            let cell = map.cell(ix, iy).expect("front cells are evaluated");
            assert!(cell.feasible());
        }
    }

    #[test]
    fn unknown_axis_keys_are_rejected() {
        let spec = GridSpec::new(
            Axis::new("missing", 0.0, 1.0, 3),
            Axis::new("py", 0.0, 1.0, 3),
        );
        let result = scan(
            &Summing,
            &base(),
            &spec,
            &total_cap(3.0),
            &PolicyLens::new(),
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(ScanError::UnknownAxisKey { .. })));
    }
}
