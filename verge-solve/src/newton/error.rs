use std::error::Error as StdError;

use thiserror::Error;

/// Errors that can occur when setting up or running a solve.
///
/// These cover configuration mistakes and evaluator failures only.
/// Infeasibility, clamping, iteration exhaustion, and the other expected
/// scientific outcomes are reported through [`Status`](super::Status)
/// on the returned solution instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("a solve needs at least one iteration variable")]
    NoVariables,

    #[error("square system required: {targets} targets vs {variables} variables")]
    NotSquare { targets: usize, variables: usize },

    #[error("variable {name:?} has invalid bounds [{lo}, {hi}]")]
    InvalidBounds { name: String, lo: f64, hi: f64 },

    #[error("variable {name:?} has a non-finite initial value")]
    NonFiniteInitial { name: String },

    #[error("duplicate iteration variable {name:?}")]
    DuplicateVariable { name: String },

    #[error("iteration variable {name:?} is not a field of the base input")]
    UnknownVariable { name: String },

    #[error("stage {stage} overrides unknown target key {key:?}")]
    UnknownStageTarget { stage: usize, key: String },

    #[error("stage {stage} has an invalid tolerance")]
    InvalidStageTol { stage: usize },

    #[error("evaluation failed")]
    Model(#[source] Box<dyn StdError + Send + Sync>),
}
