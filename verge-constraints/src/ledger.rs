use serde::Serialize;

use crate::Tier;

/// Feasibility verdict for a single assessed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Every constraint with a defined margin is satisfied.
    Pass,
    /// All hard constraints pass, but at least one diagnostic fails.
    PassWithDiagnostic,
    /// At least one hard constraint is violated.
    Fail,
}

impl Verdict {
    /// Whether the point is feasible (hard constraints all satisfied).
    #[must_use]
    pub fn passes(self) -> bool {
        matches!(self, Self::Pass | Self::PassWithDiagnostic)
    }
}

/// One constraint's signed margin against one output record.
///
/// The effective tier and the downgrade flag are recorded alongside the
/// margin so a "violated but non-blocking" diagnostic remains
/// distinguishable from a satisfied constraint after the fact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginRecord {
    pub id: String,
    /// Raw output value the margin was computed from (`NaN` = undefined).
    pub value: f64,
    /// Signed margin; positive means satisfied, `NaN` means undefined.
    pub margin: f64,
    /// Effective tier after the policy lens.
    pub tier: Tier,
    /// Whether the lens downgraded the declared tier.
    pub downgraded: bool,
}

impl MarginRecord {
    /// Whether the margin is defined (not `NaN`).
    #[must_use]
    pub fn defined(&self) -> bool {
        !self.margin.is_nan()
    }

    /// Whether the constraint is violated. Undefined margins never violate.
    #[must_use]
    pub fn violated(&self) -> bool {
        self.margin < 0.0
    }
}

/// The full margin ledger for one assessed point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ledger {
    /// All margins, in registry declaration order.
    pub margins: Vec<MarginRecord>,
    /// Ids of violated hard constraints, in registry declaration order.
    pub blocking: Vec<String>,
    /// The hard constraint with the lowest defined margin; ties broken by
    /// ascending id.
    pub dominant: Option<String>,
    pub verdict: Verdict,
}

impl Ledger {
    /// Ledger for a point whose evaluation failed outright: no margins,
    /// nothing defined, verdict `Fail`.
    #[must_use]
    pub fn evaluation_failure() -> Self {
        Self {
            margins: Vec::new(),
            blocking: Vec::new(),
            dominant: None,
            verdict: Verdict::Fail,
        }
    }

    /// Looks up one margin by constraint id.
    #[must_use]
    pub fn margin(&self, id: &str) -> Option<f64> {
        self.margins
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.margin)
    }

    /// The lowest defined margin among hard-tier constraints.
    #[must_use]
    pub fn worst_hard_margin(&self) -> Option<f64> {
        self.margins
            .iter()
            .filter(|record| record.tier == Tier::Hard && record.defined())
            .map(|record| record.margin)
            .fold(None, |worst, margin| match worst {
                Some(w) if w <= margin => Some(w),
                _ => Some(margin),
            })
    }

    /// Counts of (total, satisfied) constraints with defined margins.
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        let defined = self.margins.iter().filter(|r| r.defined());
        let total = defined.clone().count();
        let satisfied = defined.filter(|r| !r.violated()).count();
        (total, satisfied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn record(id: &str, margin: f64, tier: Tier) -> MarginRecord {
        MarginRecord {
            id: id.to_string(),
            value: 0.0,
            margin,
            tier,
            downgraded: false,
        }
    }

    #[test]
    fn worst_hard_margin_skips_diagnostics_and_nan() {
        let ledger = Ledger {
            margins: vec![
                record("a", 0.5, Tier::Hard),
                record("b", -2.0, Tier::Diagnostic),
                record("c", f64::NAN, Tier::Hard),
                record("d", -0.25, Tier::Hard),
            ],
            blocking: vec!["d".to_string()],
            dominant: Some("d".to_string()),
            verdict: Verdict::Fail,
        };

        assert_relative_eq!(ledger.worst_hard_margin().expect("defined"), -0.25);
    }

    #[test]
    fn counts_exclude_undefined_margins() {
        let ledger = Ledger {
            margins: vec![
                record("a", 0.5, Tier::Hard),
                record("b", f64::NAN, Tier::Hard),
                record("c", -1.0, Tier::Diagnostic),
            ],
            blocking: vec![],
            dominant: Some("a".to_string()),
            verdict: Verdict::PassWithDiagnostic,
        };

        assert_eq!(ledger.counts(), (2, 1));
    }

    #[test]
    fn undefined_margin_never_violates() {
        assert!(!record("a", f64::NAN, Tier::Hard).violated());
        assert!(record("a", -0.01, Tier::Hard).violated());
    }
}
