//! Double-boundary Kim-integral solver.
//!
//! Refines the QD+ boundary guess into a solution of the Kim (1990)
//! value-matching integral equation by fixed-point (Picard) iteration.
//! For a put with boundary `B` at time-to-expiry `tau`, value matching
//! against the early-exercise premium representation reads
//!
//! ```text
//! K - B = p_eur(B, K, tau)
//!       + ∫₀^tau [ r·K·e^(-r·u)·ΔN₂(B, u) - q·B·e^(-q·u)·ΔN₁(B, u) ] du
//! ```
//!
//! where `ΔNᵢ(B, u) = N(-dᵢ(B, U(tau-u), u)) - N(-dᵢ(B, L(tau-u), u))` is
//! the risk-neutral probability of the spot sitting inside the exercise
//! band `[L, U]` after time `u`. Collecting the `B` terms gives the
//! fixed-point map iterated here:
//!
//! ```text
//! B ← K · (1 - e^(-r·tau)·N(-d₂(B, K, tau)) - r·I₂)
//!       / (1 - e^(-q·tau)·N(-d₁(B, K, tau)) - q·I₁)
//! ```
//!
//! with `Iᵢ = ∫₀^tau e^(-(r|q)·u)·ΔNᵢ du` evaluated by the adaptive
//! quadrature core against the current boundary interpolant. The
//! single-boundary case is the same map with the lower frontier pinned at
//! zero, where its terms vanish.
//!
//! Near expiry the boundary derivative blows up and the representation is
//! ill-conditioned; collocation points inside the near-expiry window, and
//! points whose update degenerates (vanishing denominator, non-finite or
//! inadmissible value, band crossing), are frozen at their QD+ seed and
//! reported as diagnostics, never as a failure of the whole solve.

use std::sync::atomic::{AtomicBool, Ordering};

use amopt_core::math::distributions::norm_cdf;
use amopt_core::math::quadrature::{adaptive, QuadratureConfig};
use amopt_core::types::{OptionParameters, OptionType, PricingError, SolverError};
use tracing::{debug, warn};

use crate::boundary::{interpolate_sqrt_tau, BoundaryCurve, ExerciseBoundary};
use crate::collocation::CollocationGrid;
use crate::qdplus::{ExerciseRegime, QdPlus};

/// Volatility floor below which a boundary representation is refused.
const MIN_VOLATILITY: f64 = 1e-8;

/// Denominator floor for the fixed-point map.
const DENOMINATOR_FLOOR: f64 = 1e-10;

/// Solver settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KimSolverConfig {
    /// Number of collocation points for the boundary representation.
    pub collocation_points: usize,
    /// Convergence tolerance on the maximum relative boundary change.
    pub tolerance: f64,
    /// Iteration budget; exceeding it is reported, never silent.
    pub max_iterations: usize,
    /// Collocation points with `tau` at or below this keep their QD+ seed
    /// (the integral representation is ill-conditioned there).
    pub near_expiry_threshold: f64,
    /// Quadrature settings for the per-point time integrals.
    pub quadrature: QuadratureConfig,
}

impl Default for KimSolverConfig {
    fn default() -> Self {
        Self {
            collocation_points: 24,
            tolerance: 1e-6,
            max_iterations: 100,
            near_expiry_threshold: 1e-3,
            quadrature: QuadratureConfig {
                absolute_tolerance: 1e-9,
                relative_tolerance: 1e-7,
                max_subdivisions: 64,
            },
        }
    }
}

impl KimSolverConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.collocation_points < CollocationGrid::MIN_POINTS {
            return Err(PricingError::InvalidInput(format!(
                "need at least {} collocation points, got {}",
                CollocationGrid::MIN_POINTS,
                self.collocation_points
            )));
        }
        if !(self.tolerance > 0.0) {
            return Err(PricingError::InvalidInput(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(PricingError::InvalidInput(
                "max_iterations must be positive".to_string(),
            ));
        }
        if !(self.near_expiry_threshold >= 0.0) {
            return Err(PricingError::InvalidInput(format!(
                "near-expiry threshold must be non-negative, got {}",
                self.near_expiry_threshold
            )));
        }
        Ok(())
    }
}

/// Terminal state of a boundary solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolverStatus {
    /// The boundary change dropped under tolerance.
    Converged {
        /// Iterations used.
        iterations: usize,
        /// Final maximum relative boundary change.
        residual: f64,
    },
    /// The iteration budget ran out; the solution carries the
    /// best-so-far boundary and the caller decides whether to accept it.
    MaxIterationsExceeded {
        /// Residual at the final iteration.
        residual: f64,
    },
}

impl SolverStatus {
    /// `true` when the solve met its tolerance.
    #[inline]
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }

    /// Final maximum relative boundary change.
    pub fn residual(&self) -> f64 {
        match self {
            Self::Converged { residual, .. } => *residual,
            Self::MaxIterationsExceeded { residual } => *residual,
        }
    }
}

/// Outcome of a boundary solve: the boundary in the option's own
/// coordinates plus status and stability diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySolution {
    /// Converged (or best-so-far) exercise boundary.
    pub boundary: ExerciseBoundary,
    /// Exercise regime the parameters imply.
    pub regime: ExerciseRegime,
    /// Convergence status.
    pub status: SolverStatus,
    /// Collocation points frozen at their QD+ seed for stability.
    pub fallback_points: usize,
}

/// Fixed-point solver for the Kim integral equation.
///
/// Stateless across calls: each solve allocates its working buffers once
/// up front and swaps them between iterations, so concurrent solves from
/// multiple threads are safe without synchronisation.
#[derive(Debug, Clone, Copy)]
pub struct KimSolver {
    config: KimSolverConfig,
}

impl KimSolver {
    /// Creates a solver with the given configuration.
    pub fn new(config: KimSolverConfig) -> Self {
        Self { config }
    }

    /// Creates a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: KimSolverConfig::default(),
        }
    }

    /// The solver configuration.
    pub fn config(&self) -> &KimSolverConfig {
        &self.config
    }

    /// Solves the exercise boundary from the QD+ seed.
    ///
    /// # Errors
    /// `PricingError::InvalidInput` for invalid parameters or a
    /// volatility below the representation floor. An exhausted iteration
    /// budget is *not* an error here: it is reported through
    /// [`SolverStatus::MaxIterationsExceeded`] with the best-so-far
    /// boundary attached.
    pub fn solve(&self, params: &OptionParameters) -> Result<BoundarySolution, PricingError> {
        self.solve_inner(params, None, None)
    }

    /// Solves starting from a caller-supplied boundary instead of the QD+
    /// seed (fixed-point reuse: re-solving from a converged boundary
    /// terminates in at most a couple of iterations).
    pub fn solve_with_initial(
        &self,
        params: &OptionParameters,
        initial: &ExerciseBoundary,
    ) -> Result<BoundarySolution, PricingError> {
        self.solve_inner(params, Some(initial), None)
    }

    /// Solves with a cooperative cancellation flag checked between
    /// iterations.
    ///
    /// # Errors
    /// `SolverError::Cancelled` (wrapped in `PricingError`) when the flag
    /// is raised; input errors as for [`KimSolver::solve`].
    pub fn solve_cancellable(
        &self,
        params: &OptionParameters,
        cancel: &AtomicBool,
    ) -> Result<BoundarySolution, PricingError> {
        self.solve_inner(params, None, Some(cancel))
    }

    fn solve_inner(
        &self,
        params: &OptionParameters,
        initial: Option<&ExerciseBoundary>,
        cancel: Option<&AtomicBool>,
    ) -> Result<BoundarySolution, PricingError> {
        params.validate()?;
        self.config.validate()?;
        if params.volatility < MIN_VOLATILITY {
            return Err(PricingError::InvalidInput(format!(
                "volatility {} too small for a boundary solve",
                params.volatility
            )));
        }
        match params.option_type {
            OptionType::Put => self.solve_put(params, initial, cancel),
            OptionType::Call => {
                let dual = params.symmetric_dual();
                let scale = params.strike * params.spot;
                let dual_initial = initial.map(|b| b.symmetric_map(scale));
                let solution = self.solve_put(&dual, dual_initial.as_ref(), cancel)?;
                Ok(BoundarySolution {
                    boundary: solution.boundary.symmetric_map(scale),
                    ..solution
                })
            }
        }
    }

    fn solve_put(
        &self,
        params: &OptionParameters,
        initial: Option<&ExerciseBoundary>,
        cancel: Option<&AtomicBool>,
    ) -> Result<BoundarySolution, PricingError> {
        let strike = params.strike;
        let rate = params.rate;
        let dividend = params.dividend;
        let vol = params.volatility;

        let grid = CollocationGrid::new(params.maturity, self.config.collocation_points)?;
        let (regime, seed_upper, seed_lower) =
            QdPlus::put_seed_arrays(strike, rate, dividend, vol, &grid);

        if regime == ExerciseRegime::NoEarlyExercise {
            let curve = BoundaryCurve::new(grid.taus().to_vec(), seed_upper)?;
            return Ok(BoundarySolution {
                boundary: ExerciseBoundary::Single(curve),
                regime,
                status: SolverStatus::Converged {
                    iterations: 0,
                    residual: 0.0,
                },
                fallback_points: 0,
            });
        }
        let is_double = regime == ExerciseRegime::Double;
        let terminal_upper = seed_upper[0];

        // Working set, allocated once per solve and swapped across
        // iterations.
        let n = grid.len();
        let mut upper = seed_upper.clone();
        let mut lower = seed_lower.clone();
        let mut upper_new = vec![0.0; n];
        let mut lower_new = vec![0.0; n];

        if let Some(init) = initial {
            for (i, &tau) in grid.taus().iter().enumerate().skip(1) {
                upper[i] = init.upper().value_at(tau).clamp(0.0, terminal_upper);
                if let Some(lo) = init.lower() {
                    lower[i] = lo.value_at(tau).min(upper[i]);
                }
            }
        }

        let mut frozen: Vec<bool> = grid
            .taus()
            .iter()
            .map(|&tau| tau <= self.config.near_expiry_threshold)
            .collect();
        frozen[0] = true;

        let mut fallback_points = 0usize;
        let mut residual = f64::INFINITY;
        let taus = grid.taus();

        for iteration in 1..=self.config.max_iterations {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(SolverError::Cancelled {
                        iterations: iteration - 1,
                    }
                    .into());
                }
            }

            residual = 0.0;
            for i in 0..n {
                if frozen[i] {
                    upper_new[i] = upper[i];
                    lower_new[i] = lower[i];
                    continue;
                }
                let tau = taus[i];

                let up = self.update_point(
                    upper[i], tau, strike, rate, dividend, vol, taus, &upper, &lower,
                );
                let lo = if is_double {
                    self.update_point(
                        lower[i], tau, strike, rate, dividend, vol, taus, &upper, &lower,
                    )
                } else {
                    Some(0.0)
                };

                match (up, lo) {
                    (Some(u_raw), Some(l_raw)) if !(is_double && l_raw > u_raw) => {
                        let u_val = u_raw.min(terminal_upper);
                        let l_val = l_raw.min(u_val);
                        residual = residual
                            .max((u_val - upper[i]).abs() / upper[i].abs().max(1.0));
                        if is_double {
                            residual = residual
                                .max((l_val - lower[i]).abs() / lower[i].abs().max(1.0));
                        }
                        upper_new[i] = u_val;
                        lower_new[i] = l_val;
                    }
                    _ => {
                        // NumericallyUnstable: freeze this point at its
                        // QD+ seed and keep going.
                        warn!(
                            collocation = i,
                            tau,
                            "unstable boundary update, falling back to QD+ seed"
                        );
                        upper_new[i] = seed_upper[i];
                        lower_new[i] = seed_lower[i];
                        frozen[i] = true;
                        fallback_points += 1;
                    }
                }
            }

            std::mem::swap(&mut upper, &mut upper_new);
            std::mem::swap(&mut lower, &mut lower_new);
            debug!(iteration, residual, "boundary iteration");

            if residual < self.config.tolerance {
                return self.build_solution(
                    &grid,
                    regime,
                    upper,
                    lower,
                    SolverStatus::Converged {
                        iterations: iteration,
                        residual,
                    },
                    fallback_points,
                );
            }
        }

        warn!(
            residual,
            max_iterations = self.config.max_iterations,
            "boundary solve exhausted its iteration budget"
        );
        self.build_solution(
            &grid,
            regime,
            upper,
            lower,
            SolverStatus::MaxIterationsExceeded { residual },
            fallback_points,
        )
    }

    /// One application of the fixed-point map at a collocation point.
    ///
    /// Returns `None` when the update degenerates (vanishing denominator,
    /// non-finite or inadmissible value) so the caller can fall back to
    /// the QD+ seed.
    #[allow(clippy::too_many_arguments)]
    fn update_point(
        &self,
        b: f64,
        tau: f64,
        strike: f64,
        rate: f64,
        dividend: f64,
        vol: f64,
        taus: &[f64],
        upper: &[f64],
        lower: &[f64],
    ) -> Option<f64> {
        if b <= 0.0 {
            return Some(0.0);
        }

        let i1 = adaptive(
            |u| {
                let rem = tau - u;
                let ub = interpolate_sqrt_tau(taus, upper, rem);
                let lb = interpolate_sqrt_tau(taus, lower, rem);
                (-dividend * u).exp() * band_probability(b, ub, lb, rate, dividend, vol, u, true)
            },
            0.0,
            tau,
            &self.config.quadrature,
        );
        let i2 = adaptive(
            |u| {
                let rem = tau - u;
                let ub = interpolate_sqrt_tau(taus, upper, rem);
                let lb = interpolate_sqrt_tau(taus, lower, rem);
                (-rate * u).exp() * band_probability(b, ub, lb, rate, dividend, vol, u, false)
            },
            0.0,
            tau,
            &self.config.quadrature,
        );

        let d1_k = d1(b, strike, rate, dividend, vol, tau);
        let d2_k = d1_k - vol * tau.sqrt();
        let numerator = 1.0 - (-rate * tau).exp() * norm_cdf(-d2_k) - rate * i2.value;
        let denominator = 1.0 - (-dividend * tau).exp() * norm_cdf(-d1_k) - dividend * i1.value;

        if !numerator.is_finite()
            || !denominator.is_finite()
            || denominator.abs() < DENOMINATOR_FLOOR
        {
            return None;
        }
        let b_new = strike * numerator / denominator;
        if !b_new.is_finite() || b_new <= 0.0 || b_new > strike * 1e4 {
            return None;
        }
        Some(b_new)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_solution(
        &self,
        grid: &CollocationGrid,
        regime: ExerciseRegime,
        upper: Vec<f64>,
        lower: Vec<f64>,
        status: SolverStatus,
        fallback_points: usize,
    ) -> Result<BoundarySolution, PricingError> {
        let taus = grid.taus().to_vec();
        let boundary = if regime == ExerciseRegime::Double {
            ExerciseBoundary::double(
                BoundaryCurve::new(taus.clone(), lower)?,
                BoundaryCurve::new(taus, upper)?,
            )?
        } else {
            ExerciseBoundary::Single(BoundaryCurve::new(taus, upper)?)
        };
        Ok(BoundarySolution {
            boundary,
            regime,
            status,
            fallback_points,
        })
    }
}

/// d₁ with a boundary value in the strike slot.
#[inline]
fn d1(s: f64, k: f64, rate: f64, dividend: f64, vol: f64, tau: f64) -> f64 {
    ((s / k).ln() + (rate - dividend + 0.5 * vol * vol) * tau) / (vol * tau.sqrt())
}

/// Risk-neutral probability weight of the spot sitting inside the
/// exercise band `[lb, ub]` after time `u`, seen from spot `b`.
///
/// `use_d1` selects the `N(-d₁)` kernel (spot-measure) over the `N(-d₂)`
/// kernel (cash-measure). A zero frontier contributes nothing, which is
/// exactly the single-boundary specialisation.
#[allow(clippy::too_many_arguments)]
#[inline]
fn band_probability(
    b: f64,
    ub: f64,
    lb: f64,
    rate: f64,
    dividend: f64,
    vol: f64,
    u: f64,
    use_d1: bool,
) -> f64 {
    let shift = if use_d1 { 0.0 } else { vol * u.sqrt() };
    let mut p = 0.0;
    if ub > 0.0 {
        p += norm_cdf(-(d1(b, ub, rate, dividend, vol, u) - shift));
    }
    if lb > 0.0 {
        p -= norm_cdf(-(d1(b, lb, rate, dividend, vol, u) - shift));
    }
    p.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use amopt_core::types::OptionType;

    fn put(
        spot: f64,
        strike: f64,
        maturity: f64,
        rate: f64,
        dividend: f64,
        vol: f64,
    ) -> OptionParameters {
        OptionParameters::new(spot, strike, maturity, rate, dividend, vol, OptionType::Put)
            .unwrap()
    }

    #[test]
    fn standard_put_converges_to_single_boundary() {
        let solver = KimSolver::with_defaults();
        let solution = solver.solve(&put(100.0, 100.0, 0.5, 0.05, 0.0, 0.25)).unwrap();
        assert!(solution.status.is_converged(), "status {:?}", solution.status);
        assert!(!solution.boundary.is_double());
        let curve = solution.boundary.upper();
        // Terminal limit K·min(1, r/q) with q = 0 is K.
        assert!((curve.terminal_value() - 100.0).abs() < 1e-9);
        // The frontier sits strictly below the strike away from expiry.
        assert!(curve.value_at(0.5) < 100.0);
        assert!(curve.value_at(0.5) > 40.0);
    }

    #[test]
    fn put_boundary_decreases_with_time_to_expiry() {
        let solver = KimSolver::with_defaults();
        let solution = solver.solve(&put(100.0, 100.0, 1.0, 0.06, 0.02, 0.2)).unwrap();
        let curve = solution.boundary.upper();
        let values = curve.values();
        for w in values.windows(2) {
            assert!(
                w[1] <= w[0] + 1e-6,
                "put frontier should not increase with tau: {:?}",
                values
            );
        }
    }

    #[test]
    fn no_early_exercise_regime_returns_degenerate_boundary() {
        // r < 0, q >= 0: the American put is European.
        let solver = KimSolver::with_defaults();
        let solution = solver.solve(&put(100.0, 100.0, 0.5, -0.02, 0.01, 0.25)).unwrap();
        assert_eq!(solution.regime, ExerciseRegime::NoEarlyExercise);
        assert!(solution.status.is_converged());
        assert!(solution.boundary.upper().values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn negative_rate_band_regime_yields_double_boundary() {
        // q < r < 0: exercise band.
        let solver = KimSolver::with_defaults();
        let solution = solver.solve(&put(40.0, 100.0, 0.5, -0.01, -0.05, 0.2)).unwrap();
        assert_eq!(solution.regime, ExerciseRegime::Double);
        assert!(solution.boundary.is_double());
        let lower = solution.boundary.lower().unwrap();
        let upper = solution.boundary.upper();
        for (lo, hi) in lower.values().iter().zip(upper.values()) {
            assert!(lo <= hi, "band ordering violated: {} > {}", lo, hi);
        }
        // Terminal limits: K·r/q = 20 and K = 100.
        assert!((lower.terminal_value() - 20.0).abs() < 1e-9);
        assert!((upper.terminal_value() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn resolve_from_converged_boundary_is_idempotent() {
        let solver = KimSolver::with_defaults();
        let params = put(100.0, 100.0, 0.5, 0.05, 0.02, 0.25);
        let first = solver.solve(&params).unwrap();
        assert!(first.status.is_converged());

        let second = solver.solve_with_initial(&params, &first.boundary).unwrap();
        match second.status {
            SolverStatus::Converged { iterations, .. } => {
                assert!(iterations <= 2, "took {} iterations", iterations)
            }
            other => panic!("expected convergence, got {:?}", other),
        }
        // Same fixed point.
        let a = first.boundary.upper().values();
        let b = second.boundary.upper().values();
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-3, "{} vs {}", x, y);
        }
    }

    #[test]
    fn call_boundary_reported_in_call_coordinates() {
        let solver = KimSolver::with_defaults();
        let call = OptionParameters::new(
            100.0, 100.0, 0.25, 0.05, 0.02, 0.30, OptionType::Call,
        )
        .unwrap();
        let solution = solver.solve(&call).unwrap();
        assert!(!solution.boundary.is_double());
        let curve = solution.boundary.upper();
        // Call frontier sits above the strike and starts at
        // K·max(1, r/q) = 250 at expiry.
        assert!((curve.terminal_value() - 250.0).abs() < 1e-6);
        assert!(curve.value_at(0.25) > 100.0);
    }

    #[test]
    fn exhausted_budget_reports_best_effort() {
        let config = KimSolverConfig {
            tolerance: 1e-14,
            max_iterations: 2,
            ..KimSolverConfig::default()
        };
        let solver = KimSolver::new(config);
        let solution = solver.solve(&put(100.0, 100.0, 0.5, 0.05, 0.0, 0.25)).unwrap();
        match solution.status {
            SolverStatus::MaxIterationsExceeded { residual } => assert!(residual.is_finite()),
            other => panic!("expected budget exhaustion, got {:?}", other),
        }
        // Best-so-far boundary is still usable.
        assert!(solution.boundary.upper().value_at(0.5) > 0.0);
    }

    #[test]
    fn cancellation_flag_stops_the_solve() {
        let solver = KimSolver::with_defaults();
        let cancel = AtomicBool::new(true);
        let result = solver.solve_cancellable(&put(100.0, 100.0, 0.5, 0.05, 0.0, 0.25), &cancel);
        assert!(matches!(
            result,
            Err(PricingError::Solver(SolverError::Cancelled { .. }))
        ));
    }

    #[test]
    fn invalid_parameters_rejected() {
        let solver = KimSolver::with_defaults();
        let mut params = put(100.0, 100.0, 0.5, 0.05, 0.0, 0.25);
        params.volatility = 0.0;
        assert!(solver.solve(&params).is_err());
    }

    #[test]
    fn near_expiry_points_keep_their_seed() {
        let solver = KimSolver::with_defaults();
        let params = put(100.0, 100.0, 0.5, 0.05, 0.0, 0.25);
        let solution = solver.solve(&params).unwrap();
        let curve = solution.boundary.upper();
        let seed = QdPlus::put_upper_seed(100.0, 0.05, 0.0, 0.25, curve.taus()[1]);
        // The first interior point lies inside the near-expiry window for
        // this grid, so it must still equal the QD+ seed.
        assert!(curve.taus()[1] <= solver.config().near_expiry_threshold);
        assert!((curve.values()[1] - seed).abs() < 1e-12);
    }
}
