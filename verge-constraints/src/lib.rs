//! Constraint declarations, margin ledgers, and dominant-constraint
//! attribution.
//!
//! A [`Registry`] holds validated [`ConstraintSpec`]s and assesses one
//! output record at a time, producing a [`Ledger`]: every signed margin,
//! the blocking violations, the single dominant constraint, and a
//! [`Verdict`]. An external [`PolicyLens`] may downgrade (never upgrade)
//! an enforcement tier per assessment; the stored specs are never mutated.
//!
//! Margins are signed distances from the limit, normalized by a declared
//! scale: positive means satisfied. A `NaN` output value yields a `NaN`
//! margin, which never blocks — undefined is not the same as violated.

mod ledger;
mod policy;
mod registry;
mod spec;

pub use ledger::{Ledger, MarginRecord, Verdict};
pub use policy::{EffectiveConstraint, PolicyLens, effective};
pub use registry::{Registry, RegistryError};
pub use spec::{ConstraintSpec, Sense, SpecError, Tier};
