//! Core traits and types for the Verge feasibility framework.
//!
//! This crate defines the shared abstractions that the constraint registry,
//! the bounded Newton solver, and the exploration tools build on:
//!
//! - [`Model`] — a deterministic evaluation function mapping a typed input
//!   to a typed output
//! - [`Snapshot`] — a captured input/output pair from a model call
//! - [`Record`] / [`AdjustRecord`] — named-field access to numeric records
//!   with a stable declared order
//! - [`FieldSet`] — a validated, ordered concrete record
//! - [`Evaluator`] — a memoizing adapter around a model, keyed by the
//!   canonical digest of its input
//! - [`Observer`] — receives solver events and optionally returns control
//!   actions
//! - [`canon`] — canonical serialization and hashing for records

pub mod canon;

mod evaluator;
mod model;
mod observer;
mod record;

pub use evaluator::{CacheStats, Evaluator};
pub use model::{Model, Snapshot};
pub use observer::Observer;
pub use record::{AdjustRecord, FieldSet, FieldSetError, Record, UnknownField};
