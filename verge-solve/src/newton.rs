//! Bounded damped-Newton solver with finite-difference Jacobian,
//! backtracking line search, trust-region step cap, box projection, and an
//! optional continuation ladder.
//!
//! # Algorithm
//!
//! Iteration runs in scaled space, where each variable's `[lo, hi]` box
//! maps to `[0, 1]` so the Jacobian stays well conditioned across
//! disparate variable magnitudes. Each iteration builds a forward-difference
//! Jacobian of the residuals, solves for the Newton step, damps and caps
//! it, then backtracks until the residual norm decreases. The iterate is
//! projected back into the box after every step.
//!
//! # No-bracket policy
//!
//! A target that cannot be bracketed inside the declared box is not an
//! error: the solver returns [`Status::Clamped`] at the bound nearest to
//! the target, with the residual against the requested targets reported
//! as-is. A clamped solution never claims convergence.
//!
//! # Observer Events
//!
//! One [`Event`] per accepted iteration. Observers can return
//! [`Action::StopEarly`] to halt at the best point seen so far.

mod config;
mod error;
mod linear;
mod solution;

pub use config::Config;
pub use error::Error;
pub use solution::{FailureKind, Solution, StageReport, Status, TraceStep};

use tracing::{debug, trace};

use verge_core::{AdjustRecord, Model, Observer, Record, Snapshot};

use crate::{Stage, Target, Variable};

/// Control actions supported by the Newton solver.
pub enum Action {
    /// Stop the solver early, keeping the best point seen so far.
    StopEarly,
}

/// Iteration event emitted after each accepted step.
pub struct Event<'a> {
    /// Continuation stage index (0 for a plain solve).
    pub stage: usize,
    /// Iteration counter within the stage (1-based).
    pub iter: usize,
    /// Variable values in natural units, in declaration order.
    pub x: &'a [f64],
    /// Residuals against the stage targets.
    pub residuals: &'a [f64],
    pub residual_norm: f64,
}

/// Solves for the given targets inside the variable box.
///
/// # Errors
///
/// Returns an error if the config or the target/variable declarations are
/// invalid, or if the model fails during evaluation. Infeasibility,
/// clamping, and iteration exhaustion are statuses on the solution, not
/// errors.
pub fn solve<M, Obs>(
    model: &M,
    base: &M::Input,
    targets: &[Target],
    variables: &[Variable],
    config: &Config,
    observer: Obs,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model,
    M::Input: AdjustRecord,
    M::Output: Record + Clone,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    solve_continuation(model, base, targets, variables, &[], config, observer)
}

/// Runs a solve without observation.
///
/// # Errors
///
/// See [`solve`].
pub fn solve_unobserved<M>(
    model: &M,
    base: &M::Input,
    targets: &[Target],
    variables: &[Variable],
    config: &Config,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model,
    M::Input: AdjustRecord,
    M::Output: Record + Clone,
{
    solve(model, base, targets, variables, config, ())
}

/// Solves a continuation ladder: each stage's target overrides are applied
/// to the base targets and solved from the previous stage's point.
///
/// An empty ladder degenerates to a plain solve of the base targets. A
/// clamped stage warm-starts the next stage; a failed or stopped stage
/// aborts the ladder and its outcome is returned with the accumulated
/// trace. Every stage outcome is recorded in [`Solution::stages`].
///
/// # Errors
///
/// See [`solve`]; additionally, a stage override naming an unknown target
/// key or carrying an invalid tolerance is a configuration error.
pub fn solve_continuation<M, Obs>(
    model: &M,
    base: &M::Input,
    targets: &[Target],
    variables: &[Variable],
    stages: &[Stage],
    config: &Config,
    mut observer: Obs,
) -> Result<Solution<M::Input, M::Output>, Error>
where
    M: Model,
    M::Input: AdjustRecord,
    M::Output: Record + Clone,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    validate(base, targets, variables, config)?;
    let ladder = build_ladder(targets, stages, config)?;

    let frame = Frame {
        model,
        base,
        variables,
    };

    let mut trace = Vec::new();
    let mut reports = Vec::new();
    let mut pin_counts = vec![0u32; variables.len()];
    let mut clamped_on: Vec<String> = Vec::new();

    let s0: Vec<f64> = variables
        .iter()
        .map(|v| ((v.initial - v.lo) / (v.hi - v.lo)).clamp(0.0, 1.0))
        .collect();

    let mut total_iters = 0;
    let mut outcome = solve_stage(
        &frame,
        &ladder[0].0,
        ladder[0].1,
        config,
        0,
        s0,
        &mut pin_counts,
        &mut clamped_on,
        &mut trace,
        &mut observer,
    )?;
    total_iters += outcome.iters;
    reports.push(report_of(0, &outcome));

    for (idx, (stage_targets, tol)) in ladder.iter().enumerate().skip(1) {
        if matches!(outcome.status, Status::Failed(_) | Status::Stopped) {
            break;
        }
        let warm = outcome.s.clone();
        outcome = solve_stage(
            &frame,
            stage_targets,
            *tol,
            config,
            idx,
            warm,
            &mut pin_counts,
            &mut clamped_on,
            &mut trace,
            &mut observer,
        )?;
        total_iters += outcome.iters;
        reports.push(report_of(idx, &outcome));
    }

    debug!(
        status = ?outcome.status,
        iters = total_iters,
        residual = outcome.eval.norm,
        "solve finished"
    );

    let x_final = frame.x_of(&outcome.s);
    Ok(Solution {
        status: outcome.status,
        x: variables
            .iter()
            .map(|v| v.name.clone())
            .zip(x_final)
            .collect(),
        iters: total_iters,
        residual_norm: outcome.eval.norm,
        clamped_on,
        snapshot: Snapshot::new(outcome.eval.input, outcome.eval.output),
        trace,
        stages: reports,
    })
}

/// One evaluated point in scaled coordinates.
struct Eval<I, O> {
    input: I,
    output: O,
    residuals: Vec<f64>,
    norm: f64,
}

impl<I: Clone, O: Clone> Clone for Eval<I, O> {
    fn clone(&self) -> Self {
        Self {
            input: self.input.clone(),
            output: self.output.clone(),
            residuals: self.residuals.clone(),
            norm: self.norm,
        }
    }
}

struct StageOutcome<I, O> {
    status: Status,
    s: Vec<f64>,
    eval: Eval<I, O>,
    iters: usize,
}

fn report_of<I, O>(stage: usize, outcome: &StageOutcome<I, O>) -> StageReport {
    StageReport {
        stage,
        status: outcome.status,
        iters: outcome.iters,
        residual_norm: outcome.eval.norm,
    }
}

struct Frame<'a, M: Model> {
    model: &'a M,
    base: &'a M::Input,
    variables: &'a [Variable],
}

impl<M> Frame<'_, M>
where
    M: Model,
    M::Input: AdjustRecord,
    M::Output: Record,
{
    /// Maps scaled coordinates back to natural variable values.
    fn x_of(&self, s: &[f64]) -> Vec<f64> {
        self.variables
            .iter()
            .zip(s)
            .map(|(v, si)| v.lo + si * (v.hi - v.lo))
            .collect()
    }

    fn eval(&self, s: &[f64], targets: &[Target]) -> Result<Eval<M::Input, M::Output>, Error> {
        let mut input = self.base.clone();
        for (v, x) in self.variables.iter().zip(self.x_of(s)) {
            input
                .set(&v.name, x)
                .map_err(|_| Error::UnknownVariable {
                    name: v.name.clone(),
                })?;
        }
        let output = self
            .model
            .call(&input)
            .map_err(|e| Error::Model(Box::new(e)))?;
        let residuals: Vec<f64> = targets
            .iter()
            .map(|t| t.value - output.get(&t.key).unwrap_or(f64::NAN))
            .collect();
        let norm = l2(&residuals);
        Ok(Eval {
            input,
            output,
            residuals,
            norm,
        })
    }
}

#[allow(clippy::too_many_arguments, clippy::too_many_lines)]
fn solve_stage<M, Obs>(
    frame: &Frame<'_, M>,
    targets: &[Target],
    tol: f64,
    config: &Config,
    stage: usize,
    mut s: Vec<f64>,
    pin_counts: &mut [u32],
    clamped_on: &mut Vec<String>,
    steps: &mut Vec<TraceStep>,
    observer: &mut Obs,
) -> Result<StageOutcome<M::Input, M::Output>, Error>
where
    M: Model,
    M::Input: AdjustRecord,
    M::Output: Record + Clone,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    let n = s.len();

    let mut eval = frame.eval(&s, targets)?;
    if !eval.residuals.iter().all(|r| r.is_finite()) {
        return Ok(StageOutcome {
            status: Status::Failed(FailureKind::NanInOutputs),
            s,
            eval,
            iters: 0,
        });
    }
    if eval.norm < tol {
        return Ok(StageOutcome {
            status: Status::Converged,
            s,
            eval,
            iters: 0,
        });
    }

    // 1-D no-bracket pre-check: with no sign change across the box or at
    // the current point, the target lies outside the reachable range and
    // the nearest bound is the answer.
    if n == 1 {
        let lo_eval = frame.eval(&[0.0], targets)?;
        let hi_eval = frame.eval(&[1.0], targets)?;
        let (r_lo, r_hi, r_here) = (
            lo_eval.residuals[0],
            hi_eval.residuals[0],
            eval.residuals[0],
        );
        if r_lo.is_finite()
            && r_hi.is_finite()
            && r_lo.signum() == r_hi.signum()
            && r_lo.signum() == r_here.signum()
            && r_lo.abs() > tol
            && r_hi.abs() > tol
        {
            let (s_end, end_eval) = if r_hi.abs() <= r_lo.abs() {
                (1.0, hi_eval)
            } else {
                (0.0, lo_eval)
            };
            mark(clamped_on, &frame.variables[0].name);
            debug!(stage, residual = end_eval.norm, "target outside box; clamped");
            return Ok(StageOutcome {
                status: Status::Clamped,
                s: vec![s_end],
                eval: end_eval,
                iters: 0,
            });
        }
    }

    let mut best_s = s.clone();
    let mut best_eval = eval.clone();

    for iter in 1..=config.max_iters {
        // Forward-difference Jacobian in scaled space; backward at the
        // upper bound so the difference point stays inside the box.
        let mut jac = vec![0.0; n * n];
        for i in 0..n {
            let mut h = config.fd_step;
            if s[i] + h > 1.0 {
                h = -h;
            }
            let mut shifted = s.clone();
            shifted[i] += h;
            let pe = frame.eval(&shifted, targets)?;
            if !pe.residuals.iter().all(|r| r.is_finite()) {
                // A NaN next to the current point is an evaluator-domain
                // failure, not a singular system.
                return Ok(StageOutcome {
                    status: Status::Failed(FailureKind::NanInOutputs),
                    s: shifted,
                    eval: pe,
                    iters: iter - 1,
                });
            }
            for j in 0..n {
                jac[j * n + i] = (pe.residuals[j] - eval.residuals[j]) / h;
            }
        }

        let neg_r: Vec<f64> = eval.residuals.iter().map(|r| -r).collect();
        let direction = match linear::solve_dense(jac, neg_r, n) {
            Some(d) => d,
            None if config.relax_singular => {
                debug!(stage, iter, "singular jacobian; taking relaxation step");
                relaxation_direction(&eval.residuals, config.trust_delta)
            }
            None => {
                return Ok(StageOutcome {
                    status: Status::Failed(FailureKind::SingularJacobian),
                    s: best_s,
                    eval: best_eval,
                    iters: iter - 1,
                });
            }
        };

        let mut step: Vec<f64> = direction.iter().map(|d| d * config.damping).collect();
        let step_norm = l2(&step);
        if step_norm > config.trust_delta {
            let cap = config.trust_delta / step_norm;
            for d in &mut step {
                *d *= cap;
            }
        }

        let mut accepted = None;
        let mut alpha = 1.0;
        for backtracks in 0..=config.max_backtracks {
            let cand: Vec<f64> = s
                .iter()
                .zip(&step)
                .map(|(si, di)| (si + alpha * di).clamp(0.0, 1.0))
                .collect();
            if !moved(&cand, &s) {
                break;
            }
            let ce = frame.eval(&cand, targets)?;
            if !ce.residuals.iter().all(|r| r.is_finite()) {
                return Ok(StageOutcome {
                    status: Status::Failed(FailureKind::NanInOutputs),
                    s: cand,
                    eval: ce,
                    iters: iter - 1,
                });
            }
            if ce.norm < eval.norm {
                accepted = Some((cand, ce, backtracks));
                break;
            }
            alpha *= 0.5;
        }

        let Some((cand, cand_eval, backtracks)) = accepted else {
            // The full step was annihilated by projection: the Newton
            // direction points outside the box at a pinned bound, so the
            // boundary point is the reported result.
            let full: Vec<f64> = s
                .iter()
                .zip(&step)
                .map(|(si, di)| (si + di).clamp(0.0, 1.0))
                .collect();
            let pinned = pinned_names(frame.variables, &s);
            if !moved(&full, &s) && !pinned.is_empty() {
                for name in &pinned {
                    mark(clamped_on, name);
                }
                debug!(stage, iter, residual = eval.norm, "pinned at bounds; clamped");
                return Ok(StageOutcome {
                    status: Status::Clamped,
                    s,
                    eval,
                    iters: iter - 1,
                });
            }
            return Ok(StageOutcome {
                status: Status::Failed(FailureKind::NoDescent),
                s: best_s,
                eval: best_eval,
                iters: iter - 1,
            });
        };

        s = cand;
        eval = cand_eval;

        for (i, v) in frame.variables.iter().enumerate() {
            #[allow(clippy::float_cmp)]
            let pinned = s[i] == 0.0 || s[i] == 1.0;
            pin_counts[i] = if pinned { pin_counts[i] + 1 } else { 0 };
            if pin_counts[i] >= 2 {
                mark(clamped_on, &v.name);
            }
        }

        let x_nat = frame.x_of(&s);
        trace!(stage, iter, residual = eval.norm, backtracks, "accepted step");
        steps.push(TraceStep {
            stage,
            iter,
            x: x_nat.clone(),
            residual_norm: eval.norm,
            backtracks,
            pinned: pinned_names(frame.variables, &s),
        });

        if eval.norm < best_eval.norm {
            best_s = s.clone();
            best_eval = eval.clone();
        }

        let event = Event {
            stage,
            iter,
            x: &x_nat,
            residuals: &eval.residuals,
            residual_norm: eval.norm,
        };
        if let Some(action) = observer.observe(&event) {
            match action {
                Action::StopEarly => {
                    return Ok(StageOutcome {
                        status: Status::Stopped,
                        s: best_s,
                        eval: best_eval,
                        iters: iter,
                    });
                }
            }
        }

        if eval.norm < tol {
            return Ok(StageOutcome {
                status: Status::Converged,
                s,
                eval,
                iters: iter,
            });
        }
    }

    Ok(StageOutcome {
        status: Status::Failed(FailureKind::MaxIters),
        s: best_s,
        eval: best_eval,
        iters: config.max_iters,
    })
}

fn l2(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn moved(a: &[f64], b: &[f64]) -> bool {
    a.iter().zip(b).any(|(x, y)| (x - y).abs() > 1e-14)
}

fn pinned_names(variables: &[Variable], s: &[f64]) -> Vec<String> {
    variables
        .iter()
        .zip(s)
        .filter(|(_, si)| **si <= 0.0 || **si >= 1.0)
        .map(|(v, _)| v.name.clone())
        .collect()
}

fn mark(clamped_on: &mut Vec<String>, name: &str) {
    if !clamped_on.iter().any(|n| n == name) {
        clamped_on.push(name.to_string());
    }
}

/// Fallback direction for a singular Jacobian: step along the residuals,
/// assuming each variable raises its paired output. Kept short so the line
/// search remains in charge of acceptance.
fn relaxation_direction(residuals: &[f64], trust_delta: f64) -> Vec<f64> {
    let norm = l2(residuals);
    if norm == 0.0 {
        return vec![0.0; residuals.len()];
    }
    let length = trust_delta.min(0.1);
    residuals.iter().map(|r| r / norm * length).collect()
}

fn validate(
    base: &impl Record,
    targets: &[Target],
    variables: &[Variable],
    config: &Config,
) -> Result<(), Error> {
    config
        .validate()
        .map_err(|reason| Error::InvalidConfig { reason })?;

    if variables.is_empty() {
        return Err(Error::NoVariables);
    }
    if targets.len() != variables.len() {
        return Err(Error::NotSquare {
            targets: targets.len(),
            variables: variables.len(),
        });
    }

    for (i, v) in variables.iter().enumerate() {
        if !v.lo.is_finite() || !v.hi.is_finite() || v.lo >= v.hi {
            return Err(Error::InvalidBounds {
                name: v.name.clone(),
                lo: v.lo,
                hi: v.hi,
            });
        }
        if !v.initial.is_finite() {
            return Err(Error::NonFiniteInitial {
                name: v.name.clone(),
            });
        }
        if variables[..i].iter().any(|other| other.name == v.name) {
            return Err(Error::DuplicateVariable {
                name: v.name.clone(),
            });
        }
        if base.get(&v.name).is_none() {
            return Err(Error::UnknownVariable {
                name: v.name.clone(),
            });
        }
    }
    Ok(())
}

type Rung = (Vec<Target>, f64);

fn build_ladder(targets: &[Target], stages: &[Stage], config: &Config) -> Result<Vec<Rung>, Error> {
    if stages.is_empty() {
        return Ok(vec![(targets.to_vec(), config.tol)]);
    }

    let mut ladder = Vec::with_capacity(stages.len());
    for (idx, stage) in stages.iter().enumerate() {
        let mut merged = targets.to_vec();
        for over in &stage.targets {
            match merged.iter_mut().find(|t| t.key == over.key) {
                Some(t) => t.value = over.value,
                None => {
                    return Err(Error::UnknownStageTarget {
                        stage: idx,
                        key: over.key.clone(),
                    });
                }
            }
        }
        let tol = match stage.tol {
            Some(tol) if tol.is_finite() && tol > 0.0 => tol,
            Some(_) => return Err(Error::InvalidStageTol { stage: idx }),
            None => config.tol,
        };
        ladder.push((merged, tol));
    }
    Ok(ladder)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;

    use verge_core::FieldSet;

    /// Model producing `y = 2x`, the synthetic stand-in for a physics
    /// evaluator with one monotone output.
    struct Doubler;

    impl Model for Doubler {
        type Input = FieldSet;
        type Output = FieldSet;
        type Error = Infallible;

        fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
            let x = input.get("x").unwrap_or(f64::NAN);
            Ok(FieldSet::from_pairs([("y", 2.0 * x)]).expect("valid"))
        }
    }

    /// Model with two coupled outputs: `y1 = 2a`, `y2 = a + b`.
    struct Coupled;

    impl Model for Coupled {
        type Input = FieldSet;
        type Output = FieldSet;
        type Error = Infallible;

        fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
            let a = input.get("a").unwrap_or(f64::NAN);
            let b = input.get("b").unwrap_or(f64::NAN);
            Ok(FieldSet::from_pairs([("y1", 2.0 * a), ("y2", a + b)]).expect("valid"))
        }
    }

    /// Rank-deficient model: both outputs depend on `a + b` only.
    struct RankOne;

    impl Model for RankOne {
        type Input = FieldSet;
        type Output = FieldSet;
        type Error = Infallible;

        fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
            let sum = input.get("a").unwrap_or(0.0) + input.get("b").unwrap_or(0.0);
            Ok(FieldSet::from_pairs([("y1", sum), ("y2", sum)]).expect("valid"))
        }
    }

    /// Defined only up to `x = 3`: `y = 2x` below, `NaN` above.
    struct Ledge;

    impl Model for Ledge {
        type Input = FieldSet;
        type Output = FieldSet;
        type Error = Infallible;

        fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
            let x = input.get("x").unwrap_or(f64::NAN);
            let y = if x <= 3.0 { 2.0 * x } else { f64::NAN };
            Ok(FieldSet::from_pairs([("y", y)]).expect("valid"))
        }
    }

    /// Model whose targeted output is always undefined.
    struct Undefined;

    impl Model for Undefined {
        type Input = FieldSet;
        type Output = FieldSet;
        type Error = Infallible;

        fn call(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
            Ok(FieldSet::from_pairs([("y", f64::NAN)]).expect("valid"))
        }
    }

    fn base_x(x: f64) -> FieldSet {
        FieldSet::from_pairs([("x", x)]).expect("valid")
    }

    fn base_ab() -> FieldSet {
        FieldSet::from_pairs([("a", 0.0), ("b", 0.0)]).expect("valid")
    }

    #[test]
    fn converges_on_a_monotone_target() {
        let solution = solve_unobserved(
            &Doubler,
            &base_x(1.0),
            &[Target::new("y", 10.0)],
            &[Variable::new("x", 0.0, 10.0, 1.0)],
            &Config::default(),
        )
        .expect("valid request");

        assert!(solution.status.converged());
        assert!(solution.residual_norm < Config::default().tol);
        assert!(solution.iters <= 25);
        assert_relative_eq!(solution.x[0].1, 5.0, epsilon = 1e-5);
        assert!(solution.clamped_on.is_empty());

        // Accepted steps always descend.
        assert!(
            solution
                .trace
                .windows(2)
                .all(|w| w[1].residual_norm < w[0].residual_norm)
        );
    }

    #[test]
    fn clamps_when_the_target_is_outside_the_box() {
        let solution = solve_unobserved(
            &Doubler,
            &base_x(1.0),
            &[Target::new("y", 100.0)],
            &[Variable::new("x", 0.0, 10.0, 1.0)],
            &Config::default(),
        )
        .expect("valid request");

        assert_eq!(solution.status, Status::Clamped);
        assert_relative_eq!(solution.x[0].1, 10.0);
        assert_relative_eq!(solution.residual_norm, 80.0);
        assert_eq!(solution.clamped_on, ["x"]);
        assert!(!solution.status.converged());
    }

    #[test]
    fn solves_a_coupled_two_by_two_system() {
        let solution = solve_unobserved(
            &Coupled,
            &base_ab(),
            &[Target::new("y1", 6.0), Target::new("y2", 7.0)],
            &[
                Variable::new("a", 0.0, 10.0, 1.0),
                Variable::new("b", 0.0, 10.0, 1.0),
            ],
            &Config::default(),
        )
        .expect("valid request");

        assert!(solution.status.converged());
        assert_relative_eq!(solution.x[0].1, 3.0, epsilon = 1e-5);
        assert_relative_eq!(solution.x[1].1, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let run = || {
            solve_unobserved(
                &Coupled,
                &base_ab(),
                &[Target::new("y1", 6.0), Target::new("y2", 7.0)],
                &[
                    Variable::new("a", 0.0, 10.0, 1.0),
                    Variable::new("b", 0.0, 10.0, 1.0),
                ],
                &Config::default(),
            )
            .expect("valid request")
        };

        let first = run();
        let second = run();

        assert_eq!(first.status, second.status);
        assert_eq!(first.iters, second.iters);
        assert_eq!(first.x, second.x);
        assert_eq!(first.trace, second.trace);
    }

    #[test]
    fn nan_in_targeted_output_is_a_hard_failure() {
        let solution = solve_unobserved(
            &Undefined,
            &base_x(1.0),
            &[Target::new("y", 1.0)],
            &[Variable::new("x", 0.0, 10.0, 1.0)],
            &Config::default(),
        )
        .expect("valid request");

        assert_eq!(solution.status, Status::Failed(FailureKind::NanInOutputs));
        assert_eq!(solution.iters, 0);
    }

    #[test]
    fn nan_during_differentiation_is_a_hard_failure() {
        // Starting on the edge of the evaluator's domain, the forward
        // difference lands in the undefined region. That is a domain
        // failure, never a singular system — with or without relaxation.
        let request = |config: &Config| {
            solve_unobserved(
                &Ledge,
                &base_x(3.0),
                &[Target::new("y", 5.9)],
                &[Variable::new("x", 0.0, 10.0, 3.0)],
                config,
            )
            .expect("valid request")
        };

        let solution = request(&Config::default());
        assert_eq!(solution.status, Status::Failed(FailureKind::NanInOutputs));

        let relaxed = request(&Config {
            relax_singular: true,
            ..Config::default()
        });
        assert_eq!(relaxed.status, Status::Failed(FailureKind::NanInOutputs));
    }

    #[test]
    fn singular_jacobian_is_reported_not_regularized() {
        let solution = solve_unobserved(
            &RankOne,
            &base_ab(),
            &[Target::new("y1", 1.0), Target::new("y2", 2.0)],
            &[
                Variable::new("a", 0.0, 10.0, 1.0),
                Variable::new("b", 0.0, 10.0, 1.0),
            ],
            &Config::default(),
        )
        .expect("valid request");

        assert_eq!(
            solution.status,
            Status::Failed(FailureKind::SingularJacobian)
        );
    }

    #[test]
    fn relaxation_reaches_no_descent_instead_of_inverting() {
        let config = Config {
            relax_singular: true,
            ..Config::default()
        };
        let solution = solve_unobserved(
            &RankOne,
            &base_ab(),
            &[Target::new("y1", 1.0), Target::new("y2", 2.0)],
            &[
                Variable::new("a", 0.0, 10.0, 1.0),
                Variable::new("b", 0.0, 10.0, 1.0),
            ],
            &config,
        )
        .expect("valid request");

        // The inconsistent system has no solution; relaxation descends to
        // the least-norm neighborhood and then honestly reports no descent.
        assert_eq!(solution.status, Status::Failed(FailureKind::NoDescent));
        assert!(solution.residual_norm < l2(&[1.0, 2.0]));
    }

    #[test]
    fn continuation_warm_starts_each_stage() {
        let stages = [
            Stage::new(vec![Target::new("y", 4.0)]).with_tol(1e-4),
            Stage::new(vec![Target::new("y", 10.0)]),
        ];
        let solution = solve_continuation(
            &Doubler,
            &base_x(0.0),
            &[Target::new("y", 10.0)],
            &[Variable::new("x", 0.0, 10.0, 0.0)],
            &stages,
            &Config::default(),
            (),
        )
        .expect("valid request");

        assert!(solution.status.converged());
        assert_relative_eq!(solution.x[0].1, 5.0, epsilon = 1e-5);
        assert_eq!(solution.stages.len(), 2);
        assert!(solution.stages.iter().all(|r| r.status.converged()));
        assert!(solution.trace.iter().any(|s| s.stage == 0));
        assert!(solution.trace.iter().any(|s| s.stage == 1));
    }

    #[test]
    fn ladder_reaches_a_target_the_cold_solve_cannot() {
        // Two undamped iterations are not enough to cross the whole box
        // under the trust cap, but three short hops are.
        let config = Config {
            max_iters: 2,
            damping: 1.0,
            ..Config::default()
        };
        let targets = [Target::new("y", 18.0)];
        let variables = [Variable::new("x", 0.0, 10.0, 0.0)];

        let cold = solve_unobserved(&Doubler, &base_x(0.0), &targets, &variables, &config)
            .expect("valid request");
        assert_eq!(cold.status, Status::Failed(FailureKind::MaxIters));

        let stages = [
            Stage::new(vec![Target::new("y", 6.0)]),
            Stage::new(vec![Target::new("y", 12.0)]),
            Stage::new(vec![Target::new("y", 18.0)]),
        ];
        let warm = solve_continuation(
            &Doubler,
            &base_x(0.0),
            &targets,
            &variables,
            &stages,
            &config,
            (),
        )
        .expect("valid request");

        assert!(warm.status.converged());
        assert_relative_eq!(warm.x[0].1, 9.0, epsilon = 1e-5);
    }

    #[test]
    fn observer_can_stop_the_iteration() {
        let mut events = 0usize;
        let observer = |event: &Event<'_>| {
            events += 1;
            (event.iter >= 2).then_some(Action::StopEarly)
        };

        let config = Config {
            // Slow the march so convergence cannot beat the observer.
            damping: 0.1,
            ..Config::default()
        };
        let solution = solve(
            &Doubler,
            &base_x(0.0),
            &[Target::new("y", 10.0)],
            &[Variable::new("x", 0.0, 10.0, 0.0)],
            &config,
            observer,
        )
        .expect("valid request");

        assert_eq!(solution.status, Status::Stopped);
        assert_eq!(events, 2);
    }

    #[test]
    fn rejects_non_square_systems() {
        let result = solve_unobserved(
            &Coupled,
            &base_ab(),
            &[Target::new("y1", 6.0)],
            &[
                Variable::new("a", 0.0, 10.0, 1.0),
                Variable::new("b", 0.0, 10.0, 1.0),
            ],
            &Config::default(),
        );
        assert!(matches!(result, Err(Error::NotSquare { .. })));
    }

    #[test]
    fn rejects_unknown_iteration_variables() {
        let result = solve_unobserved(
            &Doubler,
            &base_x(1.0),
            &[Target::new("y", 10.0)],
            &[Variable::new("missing", 0.0, 10.0, 1.0)],
            &Config::default(),
        );
        assert!(matches!(result, Err(Error::UnknownVariable { .. })));
    }

    #[test]
    fn rejects_zero_variables() {
        let result = solve_unobserved(
            &Doubler,
            &base_x(1.0),
            &[],
            &[],
            &Config::default(),
        );
        assert!(matches!(result, Err(Error::NoVariables)));
    }

    #[test]
    fn rejects_stage_overrides_for_unknown_targets() {
        let stages = [Stage::new(vec![Target::new("z", 1.0)])];
        let result = solve_continuation(
            &Doubler,
            &base_x(1.0),
            &[Target::new("y", 10.0)],
            &[Variable::new("x", 0.0, 10.0, 1.0)],
            &stages,
            &Config::default(),
            (),
        );
        assert!(matches!(result, Err(Error::UnknownStageTarget { .. })));
    }
}
