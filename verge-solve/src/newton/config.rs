/// Configuration for the bounded Newton solver.
///
/// `trust_delta` and `fd_step` are expressed in scaled variable space,
/// where each variable's `[lo, hi]` box maps to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Iteration cap per stage.
    pub max_iters: usize,
    /// Residual-norm convergence tolerance.
    pub tol: f64,
    /// Newton step damping factor in `(0, 1]`.
    pub damping: f64,
    /// Euclidean cap on the damped step in scaled space. An over-long step
    /// is rescaled uniformly; its direction is preserved.
    pub trust_delta: f64,
    /// Line-search halvings before giving up on a step.
    pub max_backtracks: usize,
    /// Forward-difference step in scaled space.
    pub fd_step: f64,
    /// When the Jacobian is numerically singular, substitute a damped
    /// steepest-descent step instead of failing. Off by default: a singular
    /// Jacobian is reported, never silently regularized.
    pub relax_singular: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iters: 50,
            tol: 1e-6,
            damping: 0.8,
            trust_delta: 0.25,
            max_backtracks: 8,
            fd_step: 1e-6,
            relax_singular: false,
        }
    }
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a reason string if any parameter is out of range.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.tol.is_finite() || self.tol <= 0.0 {
            return Err("tol must be finite and positive");
        }
        if !self.damping.is_finite() || self.damping <= 0.0 || self.damping > 1.0 {
            return Err("damping must be in (0, 1]");
        }
        if !self.trust_delta.is_finite() || self.trust_delta <= 0.0 {
            return Err("trust_delta must be finite and positive");
        }
        if !self.fd_step.is_finite() || self.fd_step <= 0.0 || self.fd_step >= 1.0 {
            return Err("fd_step must be in (0, 1)");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let bad = Config {
            damping: 0.0,
            ..Config::default()
        };
        assert!(bad.validate().is_err());

        let bad = Config {
            tol: f64::NAN,
            ..Config::default()
        };
        assert!(bad.validate().is_err());

        let bad = Config {
            fd_step: 1.0,
            ..Config::default()
        };
        assert!(bad.validate().is_err());
    }
}
