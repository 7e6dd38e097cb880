//! Feasible-only Pareto extraction over named objectives.

use serde::{Deserialize, Serialize};

use verge_constraints::Verdict;

/// Optimization direction for one objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Minimize,
    Maximize,
}

/// One named objective read from a candidate's output record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub key: String,
    pub direction: Direction,
}

impl Objective {
    pub fn new(key: impl Into<String>, direction: Direction) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }
}

/// A candidate for Pareto ranking: its feasibility verdict and its
/// objective values, aligned with the objective list.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub verdict: Verdict,
    pub values: Vec<f64>,
}

impl Candidate {
    #[must_use]
    pub fn new(verdict: Verdict, values: Vec<f64>) -> Self {
        Self { verdict, values }
    }
}

/// Extracts the Pareto-efficient subset of `candidates`, returning their
/// indices in input order.
///
/// Infeasible candidates (`Verdict::Fail`) never enter the front — an
/// infeasible point cannot trade off against anything. Candidates with a
/// non-finite or missing objective value are likewise excluded: undefined
/// cannot be ranked. Exact duplicates keep the first-seen candidate only,
/// so repeated runs return identical fronts.
#[must_use]
pub fn pareto_front(candidates: &[Candidate], objectives: &[Objective]) -> Vec<usize> {
    // Orient every rankable candidate to minimization.
    let oriented: Vec<Option<Vec<f64>>> = candidates
        .iter()
        .map(|c| {
            if c.verdict == Verdict::Fail || c.values.len() != objectives.len() {
                return None;
            }
            if c.values.iter().any(|v| !v.is_finite()) {
                return None;
            }
            Some(
                c.values
                    .iter()
                    .zip(objectives)
                    .map(|(v, o)| match o.direction {
                        Direction::Minimize => *v,
                        Direction::Maximize => -v,
                    })
                    .collect(),
            )
        })
        .collect();

    let mut front = Vec::new();
    'candidates: for (i, vi) in oriented.iter().enumerate() {
        let Some(vi) = vi else { continue };
        for (j, vj) in oriented.iter().enumerate() {
            let Some(vj) = vj else { continue };
            if j == i {
                continue;
            }
            if dominates(vj, vi) {
                continue 'candidates;
            }
            if j < i && vj == vi {
                continue 'candidates;
            }
        }
        front.push(i);
    }
    front
}

/// Whether `a` dominates `b`: at least as good everywhere, strictly better
/// somewhere. Both are oriented to minimization.
fn dominates(a: &[f64], b: &[f64]) -> bool {
    a.iter().zip(b).all(|(x, y)| x <= y) && a.iter().zip(b).any(|(x, y)| x < y)
}
