//! Bounded Newton-continuation solving for feasibility targets.
//!
//! A solve adjusts named, box-bounded iteration variables on a base input
//! record until declared evaluator outputs match their targets. The method
//! is a damped finite-difference Newton iteration with a trust-region step
//! cap, a backtracking line search, and box projection after every step.
//!
//! Expected scientific outcomes — infeasibility, a target outside the
//! declared box, iteration exhaustion — are structured [`Status`] values
//! on the returned [`Solution`], never errors. Only configuration mistakes
//! and evaluator failures return `Err`.
//!
//! [`Status`]: newton::Status
//! [`Solution`]: newton::Solution

pub mod newton;

mod request;

pub use request::{Stage, Target, Variable};
