//! Uncertainty corner classification.
//!
//! An [`UncertaintyBox`] gives each uncertain input a normalized interval.
//! [`classify`] evaluates the nominal center plus every corner of the box
//! through the same constraint registry and reduces the verdicts: a design
//! that passes at the center but fails at a corner is a *mirage*, reported
//! as [`BoxVerdict::Fragile`] rather than a pass.
//!
//! Corner enumeration is frozen: dimensions ordered by ascending name,
//! corners in binary counting order with the first dimension as the most
//! significant bit. Reports are byte-for-byte reproducible across runs.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use verge_constraints::{Ledger, PolicyLens, Registry};
use verge_core::{AdjustRecord, Model, Record};

/// Corner counts grow as `2^N`; boxes beyond this many dimensions are a
/// configuration error, never a silent truncation.
pub const MAX_DIMS: usize = 12;

/// A normalized uncertainty interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    /// Builds an interval from two finite endpoints, in either order.
    #[must_use]
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            lo: a.min(b),
            hi: a.max(b),
        }
    }
}

/// Per-input uncertainty intervals, dimensions ordered by ascending name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UncertaintyBox {
    dims: Vec<(String, Interval)>,
}

impl UncertaintyBox {
    /// Builds a box from `(name, lo, hi)` triples. Insertion order does not
    /// matter; dimensions are sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or duplicate name, a non-finite
    /// endpoint, or more than [`MAX_DIMS`] dimensions.
    pub fn new<S: Into<String>>(
        dims: impl IntoIterator<Item = (S, f64, f64)>,
    ) -> Result<Self, CornerError> {
        let mut collected: Vec<(String, Interval)> = Vec::new();
        for (name, a, b) in dims {
            let name = name.into();
            if name.is_empty() {
                return Err(CornerError::EmptyDimName);
            }
            if !a.is_finite() || !b.is_finite() {
                return Err(CornerError::NonFiniteInterval { name });
            }
            if collected.iter().any(|(n, _)| *n == name) {
                return Err(CornerError::DuplicateDim { name });
            }
            collected.push((name, Interval::new(a, b)));
        }
        if collected.len() > MAX_DIMS {
            return Err(CornerError::TooManyDims {
                dims: collected.len(),
            });
        }
        collected.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(Self { dims: collected })
    }

    #[must_use]
    pub fn dims(&self) -> &[(String, Interval)] {
        &self.dims
    }

    /// `2^N` for an `N`-dimensional box.
    #[must_use]
    pub fn corner_count(&self) -> usize {
        1 << self.dims.len()
    }

    /// The input values at corner `index`: dimension `i` takes its `hi`
    /// end iff bit `i` of the index is set, counting from the most
    /// significant bit.
    fn corner_values(&self, index: usize) -> impl Iterator<Item = (&str, f64)> {
        let n = self.dims.len();
        self.dims.iter().enumerate().map(move |(i, (name, iv))| {
            let take_hi = (index >> (n - 1 - i)) & 1 == 1;
            (name.as_str(), if take_hi { iv.hi } else { iv.lo })
        })
    }
}

/// Uncertainty-aware verdict for one design point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoxVerdict {
    /// The center and every corner pass.
    RobustPass,
    /// The center passes but at least one corner does not — a mirage.
    Fragile,
    /// The center itself fails.
    Fail,
}

/// One assessed corner.
#[derive(Debug, Clone, Serialize)]
pub struct CornerRecord {
    /// Corner index in the frozen enumeration order.
    pub index: usize,
    /// The values applied at this corner, in dimension order.
    pub values: Vec<(String, f64)>,
    pub ledger: Ledger,
    /// Evaluator failure message; such a corner is recorded as `Fail`.
    pub note: Option<String>,
}

/// The full corner classification for one design point.
#[derive(Debug, Clone, Serialize)]
pub struct CornerReport {
    pub verdict: BoxVerdict,
    pub center: Ledger,
    /// Present when the center evaluation itself failed.
    pub center_note: Option<String>,
    /// All `2^N` corners, in enumeration order.
    pub corners: Vec<CornerRecord>,
    /// Index of the corner with the most negative hard margin, when any
    /// corner has one defined.
    pub worst_corner: Option<usize>,
}

/// Box and dimension declaration errors.
#[derive(Debug, Error)]
pub enum CornerError {
    #[error("uncertainty box exceeds {MAX_DIMS} dimensions ({dims})")]
    TooManyDims { dims: usize },

    #[error("uncertainty dimension name must not be empty")]
    EmptyDimName,

    #[error("uncertainty dimension {name:?} has a non-finite endpoint")]
    NonFiniteInterval { name: String },

    #[error("duplicate uncertainty dimension {name:?}")]
    DuplicateDim { name: String },

    #[error("uncertainty dimension {name:?} is not a field of the base input")]
    UnknownDim { name: String },
}

/// Evaluates the center and every corner of the box, assessing each point
/// against the registry.
///
/// A corner's evaluator failure is that corner's `Fail` (with a note); all
/// corners are always enumerated so the report shape is a pure function of
/// the box.
///
/// # Errors
///
/// Returns an error when a box dimension is not a field of the base input.
pub fn classify<M>(
    model: &M,
    base: &M::Input,
    ubox: &UncertaintyBox,
    registry: &Registry,
    lens: &PolicyLens,
) -> Result<CornerReport, CornerError>
where
    M: Model,
    M::Input: AdjustRecord,
    M::Output: Record,
{
    let (center, center_note) = assess(model, base, registry, lens);

    let mut corners = Vec::with_capacity(ubox.corner_count());
    for index in 0..ubox.corner_count() {
        let mut input = base.clone();
        let mut values = Vec::with_capacity(ubox.dims.len());
        for (name, value) in ubox.corner_values(index) {
            input.set(name, value).map_err(|_| CornerError::UnknownDim {
                name: name.to_string(),
            })?;
            values.push((name.to_string(), value));
        }

        let (ledger, note) = assess(model, &input, registry, lens);
        trace!(corner = index, verdict = ?ledger.verdict, "assessed corner");
        corners.push(CornerRecord {
            index,
            values,
            ledger,
            note,
        });
    }

    let worst_corner = corners
        .iter()
        .filter_map(|c| c.ledger.worst_hard_margin().map(|m| (c.index, m)))
        .fold(None, |worst: Option<(usize, f64)>, (index, margin)| {
            match worst {
                Some((_, w)) if w <= margin => worst,
                _ => Some((index, margin)),
            }
        })
        .map(|(index, _)| index);

    let verdict = if !center.verdict.passes() {
        BoxVerdict::Fail
    } else if corners.iter().all(|c| c.ledger.verdict.passes()) {
        BoxVerdict::RobustPass
    } else {
        BoxVerdict::Fragile
    };
    debug!(?verdict, corners = corners.len(), "classified uncertainty box");

    Ok(CornerReport {
        verdict,
        center,
        center_note,
        corners,
        worst_corner,
    })
}

fn assess<M>(
    model: &M,
    input: &M::Input,
    registry: &Registry,
    lens: &PolicyLens,
) -> (Ledger, Option<String>)
where
    M: Model,
    M::Output: Record,
{
    match model.call(input) {
        Ok(output) => (registry.assess(&output, lens), None),
        Err(e) => (Ledger::evaluation_failure(), Some(e.to_string())),
    }
}
