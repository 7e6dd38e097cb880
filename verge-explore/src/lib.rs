//! Design-space exploration over constraint-governed models.
//!
//! Three views of a design space, all driven by the same
//! [`Model`](verge_core::Model) + [`Registry`](verge_constraints::Registry)
//! pair:
//!
//! - [`scan`](scan::scan): a rectangular dominance map with per-cell margin
//!   ledgers and robustness labels, cooperatively cancellable.
//! - [`pareto_front`](pareto::pareto_front): feasible-only Pareto extraction
//!   over named objectives.
//! - [`classify`](corners::classify): deterministic corner enumeration of an
//!   uncertainty box, separating robust passes from fragile mirages.

mod cancel;
pub mod corners;
pub mod pareto;
pub mod scan;

pub use cancel::CancelToken;
