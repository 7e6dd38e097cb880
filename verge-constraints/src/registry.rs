use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use verge_core::Record;

use crate::{
    ConstraintSpec, Ledger, MarginRecord, PolicyLens, SpecError, Tier, Verdict, effective,
};

/// A validated set of constraint declarations.
///
/// Assessment is a pure function of one output record and a policy lens;
/// the registry itself is read-only configuration and is never mutated
/// during a run.
#[derive(Debug, Clone)]
pub struct Registry {
    specs: Vec<ConstraintSpec>,
}

/// Errors that can occur when building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("failed to parse constraint contract")]
    Contract(#[source] serde_json::Error),
}

impl Registry {
    /// Builds a registry from declarations, validating each one.
    ///
    /// # Errors
    ///
    /// Returns an error if any declaration is malformed or an id repeats.
    pub fn new(specs: Vec<ConstraintSpec>) -> Result<Self, SpecError> {
        let mut seen = BTreeSet::new();
        for spec in &specs {
            spec.validate()?;
            if !seen.insert(spec.id.as_str()) {
                return Err(SpecError::DuplicateId {
                    id: spec.id.clone(),
                });
            }
        }
        Ok(Self { specs })
    }

    /// Builds a registry from an external JSON contract: an array of
    /// constraint declarations.
    ///
    /// # Errors
    ///
    /// Returns an error if the contract does not parse or a declaration is
    /// malformed.
    pub fn from_json(contract: &str) -> Result<Self, RegistryError> {
        let specs: Vec<ConstraintSpec> =
            serde_json::from_str(contract).map_err(RegistryError::Contract)?;
        Self::new(specs).map_err(Into::into)
    }

    /// The validated declarations, in declaration order.
    #[must_use]
    pub fn specs(&self) -> &[ConstraintSpec] {
        &self.specs
    }

    /// Assesses one output record, producing the full margin ledger.
    ///
    /// A missing output key reads as `NaN` (undefined), which never blocks.
    /// The dominant constraint is the hard-tier entry with the lowest
    /// defined margin; equal margins resolve to the ascending id so the
    /// attribution is reproducible across runs.
    pub fn assess(&self, output: &impl Record, lens: &PolicyLens) -> Ledger {
        let mut margins = Vec::with_capacity(self.specs.len());
        let mut blocking = Vec::new();
        let mut dominant: Option<(&str, f64)> = None;
        let mut diagnostic_failed = false;

        for spec in &self.specs {
            let eff = effective(spec, lens);
            let value = output.get(&spec.output_key).unwrap_or(f64::NAN);
            let margin = spec.margin_of(value);

            if eff.tier == Tier::Hard && !margin.is_nan() {
                #[allow(clippy::float_cmp)]
                let better = match dominant {
                    Some((best_id, best)) => {
                        margin < best || (margin == best && spec.id.as_str() < best_id)
                    }
                    None => true,
                };
                if better {
                    dominant = Some((spec.id.as_str(), margin));
                }
                if margin < 0.0 {
                    blocking.push(spec.id.clone());
                }
            }
            if eff.tier == Tier::Diagnostic && margin < 0.0 {
                diagnostic_failed = true;
            }

            margins.push(MarginRecord {
                id: spec.id.clone(),
                value,
                margin,
                tier: eff.tier,
                downgraded: eff.downgraded,
            });
        }

        let verdict = if !blocking.is_empty() {
            Verdict::Fail
        } else if diagnostic_failed {
            Verdict::PassWithDiagnostic
        } else {
            Verdict::Pass
        };

        if verdict == Verdict::Fail {
            debug!(
                dominant = dominant.map(|(id, _)| id),
                blocking = blocking.len(),
                "point infeasible"
            );
        }

        Ledger {
            margins,
            blocking,
            dominant: dominant.map(|(id, _)| id.to_string()),
            verdict,
        }
    }
}
