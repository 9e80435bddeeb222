//! Brent's method root finder.

use crate::types::SolverError;

use super::SolverConfig;

/// Brent's method: bisection robustness with secant / inverse-quadratic
/// speed, no derivatives required.
///
/// Guaranteed to converge for a continuous function with a valid bracket;
/// falls back to bisection whenever an interpolated step would leave the
/// bracket or make insufficient progress.
///
/// # Examples
/// ```
/// use amopt_core::math::solvers::{BrentSolver, SolverConfig};
///
/// let solver = BrentSolver::new(SolverConfig::default());
/// let root = solver.find_root(|x| x * x - 2.0, 0.0, 2.0).unwrap();
/// assert!((root - std::f64::consts::SQRT_2).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BrentSolver {
    config: SolverConfig,
}

impl BrentSolver {
    /// Creates a solver with the given configuration.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Creates a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: SolverConfig::default(),
        }
    }

    /// The solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Finds a root of `f` inside the bracket `[a, b]`.
    ///
    /// # Errors
    /// - `SolverError::NoBracket` if `f(a)` and `f(b)` do not straddle
    ///   zero (or either endpoint value is non-finite)
    /// - `SolverError::MaxIterationsExceeded` if the iteration budget runs
    ///   out before the bracket shrinks below tolerance
    pub fn find_root<F>(&self, f: F, a: f64, b: f64) -> Result<f64, SolverError>
    where
        F: Fn(f64) -> f64,
    {
        let mut a = a;
        let mut b = b;
        let mut fa = f(a);
        let mut fb = f(b);

        if !fa.is_finite() || !fb.is_finite() {
            return Err(SolverError::NoBracket { a, b });
        }
        if fa == 0.0 {
            return Ok(a);
        }
        if fb == 0.0 {
            return Ok(b);
        }
        if fa.signum() == fb.signum() {
            return Err(SolverError::NoBracket { a, b });
        }

        let mut c = a;
        let mut fc = fa;
        let mut d = b - a;
        let mut e = d;

        for _ in 0..self.config.max_iterations {
            // Re-orient so that b is the best estimate and [b, c] brackets.
            if fb.signum() == fc.signum() {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * self.config.tolerance;
            let xm = 0.5 * (c - b);
            if xm.abs() <= tol1 || fb == 0.0 {
                return Ok(b);
            }

            if e.abs() >= tol1 && fa.abs() > fb.abs() {
                // Attempt interpolation: secant if only two points are
                // distinct, inverse quadratic otherwise.
                let s = fb / fa;
                let (mut p, mut q);
                if a == c {
                    p = 2.0 * xm * s;
                    q = 1.0 - s;
                } else {
                    let t = fa / fc;
                    let r = fb / fc;
                    p = s * (2.0 * xm * t * (t - r) - (b - a) * (r - 1.0));
                    q = (t - 1.0) * (r - 1.0) * (s - 1.0);
                }
                if p > 0.0 {
                    q = -q;
                }
                p = p.abs();

                let accept_1 = 3.0 * xm * q - (tol1 * q).abs();
                let accept_2 = (e * q).abs();
                if 2.0 * p < accept_1.min(accept_2) {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }

            a = b;
            fa = fb;
            if d.abs() > tol1 {
                b += d;
            } else {
                b += if xm >= 0.0 { tol1 } else { -tol1 };
            }
            fb = f(b);
            if !fb.is_finite() {
                return Err(SolverError::NoBracket { a, b });
            }
        }

        Err(SolverError::MaxIterationsExceeded {
            iterations: self.config.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_sqrt_2() {
        let solver = BrentSolver::with_defaults();
        let root = solver.find_root(|x| x * x - 2.0, 0.0, 2.0).unwrap();
        assert!((root - std::f64::consts::SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn finds_cubic_root() {
        let solver = BrentSolver::with_defaults();
        let f = |x: f64| x * x * x - x - 2.0;
        let root = solver.find_root(f, 1.0, 2.0).unwrap();
        assert!(f(root).abs() < 1e-9);
    }

    #[test]
    fn finds_pi_from_sine() {
        let solver = BrentSolver::with_defaults();
        let root = solver.find_root(|x| x.sin(), 3.0, 4.0).unwrap();
        assert!((root - std::f64::consts::PI).abs() < 1e-9);
    }

    #[test]
    fn reversed_bracket_works() {
        let solver = BrentSolver::with_defaults();
        let root = solver.find_root(|x| x * x - 2.0, 2.0, 0.0).unwrap();
        assert!((root - std::f64::consts::SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn root_at_endpoint_short_circuits() {
        let solver = BrentSolver::with_defaults();
        let root = solver.find_root(|x| x - 1.0, 1.0, 2.0).unwrap();
        assert_eq!(root, 1.0);
    }

    #[test]
    fn same_sign_is_no_bracket() {
        let solver = BrentSolver::with_defaults();
        let result = solver.find_root(|x| x * x + 1.0, -1.0, 1.0);
        assert!(matches!(result, Err(SolverError::NoBracket { .. })));
    }

    #[test]
    fn non_finite_endpoint_is_no_bracket() {
        let solver = BrentSolver::with_defaults();
        let result = solver.find_root(|x| 1.0 / x, 0.0, 1.0);
        assert!(matches!(result, Err(SolverError::NoBracket { .. })));
    }

    #[test]
    fn impossible_tolerance_exceeds_budget() {
        let solver = BrentSolver::new(SolverConfig::new(1e-300, 3));
        let result = solver.find_root(|x| (x - 0.123456).powi(3), 0.0, 1.0);
        assert!(matches!(
            result,
            Err(SolverError::MaxIterationsExceeded { iterations: 3 })
        ));
    }

    #[test]
    fn flat_region_converges() {
        // x - cos(x) has a slowly varying derivative near the root.
        let solver = BrentSolver::with_defaults();
        let f = |x: f64| x - x.cos();
        let root = solver.find_root(f, 0.0, 1.0).unwrap();
        assert!(f(root).abs() < 1e-9);
    }
}
