use serde::Serialize;

/// Robustness label for a feasible-region cell, derived from the feasible
/// fraction of its 3x3 neighborhood (evaluated cells only, the cell
/// itself included).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Robustness {
    /// Feasible fraction >= 0.9.
    Robust,
    /// Feasible fraction >= 0.6.
    Balanced,
    /// Feasible fraction >= 0.2.
    Brittle,
    /// Surrounded almost entirely by infeasibility.
    KnifeEdge,
}

impl Robustness {
    pub(crate) fn from_fraction(fraction: f64) -> Self {
        if fraction >= 0.9 {
            Self::Robust
        } else if fraction >= 0.6 {
            Self::Balanced
        } else if fraction >= 0.2 {
            Self::Brittle
        } else {
            Self::KnifeEdge
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges_are_inclusive() {
        assert_eq!(Robustness::from_fraction(1.0), Robustness::Robust);
        assert_eq!(Robustness::from_fraction(0.9), Robustness::Robust);
        assert_eq!(Robustness::from_fraction(0.89), Robustness::Balanced);
        assert_eq!(Robustness::from_fraction(0.6), Robustness::Balanced);
        assert_eq!(Robustness::from_fraction(0.59), Robustness::Brittle);
        assert_eq!(Robustness::from_fraction(0.2), Robustness::Brittle);
        assert_eq!(Robustness::from_fraction(0.19), Robustness::KnifeEdge);
        assert_eq!(Robustness::from_fraction(0.0), Robustness::KnifeEdge);
    }
}
