use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{ConstraintSpec, Tier};

/// External enforcement-tier overrides, keyed by constraint id.
///
/// A lens expresses evaluation intent (e.g. research vs. reactor) without
/// touching the stored declarations. Overrides can only relax a tier:
/// `hard → diagnostic → ignored`. An override that would tighten a tier is
/// ignored, so a lens can never promote a diagnostic check into a blocker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyLens {
    overrides: BTreeMap<String, Tier>,
}

impl PolicyLens {
    /// An empty lens that leaves every declared tier in place.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style override for one constraint id.
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, tier: Tier) -> Self {
        self.overrides.insert(id.into(), tier);
        self
    }

    /// Builds a lens from `(id, tier)` pairs.
    pub fn from_overrides<K, I>(overrides: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Tier)>,
    {
        Self {
            overrides: overrides
                .into_iter()
                .map(|(id, tier)| (id.into(), tier))
                .collect(),
        }
    }

    fn override_for(&self, id: &str) -> Option<Tier> {
        self.overrides.get(id).copied()
    }
}

/// The enforcement tier a constraint carries after applying a policy lens.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveConstraint<'a> {
    pub spec: &'a ConstraintSpec,
    pub tier: Tier,
    pub downgraded: bool,
}

/// Applies a lens to one declaration.
///
/// Pure: the spec is never mutated, and the result records whether a
/// downgrade took effect so downstream consumers can distinguish "violated
/// but non-blocking" from "satisfied".
#[must_use]
pub fn effective<'a>(spec: &'a ConstraintSpec, lens: &PolicyLens) -> EffectiveConstraint<'a> {
    match lens.override_for(&spec.id) {
        Some(tier) if tier > spec.tier => EffectiveConstraint {
            spec,
            tier,
            downgraded: true,
        },
        _ => EffectiveConstraint {
            spec,
            tier: spec.tier,
            downgraded: false,
        },
    }
}
