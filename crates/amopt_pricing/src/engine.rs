//! The boundary-based pricing engine.
//!
//! An American option's value decomposes as the European value plus the
//! early-exercise premium
//!
//! ```text
//! V(S) = v_eur(S) + ∫₀^tau e^(-..u) · (local exercise gain) · P(in region) du
//! ```
//!
//! where the probability weights are evaluated against the converged
//! exercise boundary. Below the near-expiry threshold the engine switches
//! to the QD+-only closed form instead of the full boundary solve: the
//! integral representation is ill-conditioned there, and the switch is a
//! deterministic, documented regime change rather than an exception
//! fallback.

use amopt_boundary::{BoundarySolution, ExerciseBoundary, KimSolver, KimSolverConfig, QdPlus};
use amopt_core::math::black_scholes::BlackScholes;
use amopt_core::math::distributions::norm_cdf;
use amopt_core::math::quadrature::{adaptive, QuadratureConfig};
use amopt_core::math::solvers::SolverConfig;
use amopt_core::types::{OptionParameters, OptionPricing, OptionType, PricingError, SolverError};
use tracing::debug;

/// Volatility floor below which pricing degrades to the closed form.
pub(crate) const MIN_VOLATILITY: f64 = 1e-8;

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Boundary-solver settings.
    pub solver: KimSolverConfig,
    /// Maturities at or below this use QD+-only pricing (default three
    /// trading days, 3/252 years).
    pub near_expiry_threshold: f64,
    /// Accept a best-so-far boundary when the solver exhausts its
    /// iteration budget instead of failing the pricing request.
    pub accept_best_effort: bool,
    /// Implied-volatility bracket.
    pub iv_bracket: (f64, f64),
    /// Implied-volatility root-finder settings.
    pub iv_solver: SolverConfig,
    /// Quadrature settings for the premium integral.
    pub quadrature: QuadratureConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            solver: KimSolverConfig::default(),
            near_expiry_threshold: 3.0 / 252.0,
            accept_best_effort: false,
            iv_bracket: (1e-4, 5.0),
            iv_solver: SolverConfig::default(),
            quadrature: QuadratureConfig {
                absolute_tolerance: 1e-9,
                relative_tolerance: 1e-7,
                max_subdivisions: 64,
            },
        }
    }
}

/// American option pricing engine over a solved exercise boundary.
///
/// Stateless across calls; safe to share between threads by reference.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryEngine {
    config: EngineConfig,
}

impl BoundaryEngine {
    /// Creates an engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Solves the exercise boundary for the given parameters.
    ///
    /// Exposed separately from pricing so a caller-owned cache can reuse
    /// a converged boundary across repeated Greek-bump pricings; the
    /// engine itself never caches.
    ///
    /// # Errors
    /// Invalid parameters, or `SolverError::MaxIterationsExceeded` when
    /// the budget runs out and `accept_best_effort` is off.
    pub fn solve_boundary(
        &self,
        params: &OptionParameters,
    ) -> Result<BoundarySolution, PricingError> {
        let solution = KimSolver::new(self.config.solver).solve(params)?;
        if !solution.status.is_converged() && !self.config.accept_best_effort {
            return Err(SolverError::MaxIterationsExceeded {
                iterations: self.config.solver.max_iterations,
            }
            .into());
        }
        if !solution.status.is_converged() {
            debug!(
                residual = solution.status.residual(),
                "accepting best-effort boundary"
            );
        }
        Ok(solution)
    }

    /// Prices an option and its Greeks.
    ///
    /// The boundary is solved once and reused for the spot-bump Greeks;
    /// see the `greeks` module for the bump conventions and the
    /// fail-soft policy.
    ///
    /// # Errors
    /// `PricingError::InvalidInput` on invalid parameters; solver
    /// failures propagate per the fail-loud policy. Individual Greek
    /// failures do not error; they yield `0.0`.
    pub fn price_option(&self, params: &OptionParameters) -> Result<OptionPricing, PricingError> {
        params.validate()?;
        if self.uses_closed_form(params) {
            let price = QdPlus::price(params)?;
            return Ok(self.greeks_with_price(params, price, None));
        }
        let solution = self.solve_boundary(params)?;
        let price = self.price_with_boundary(params, &solution.boundary)?;
        Ok(self.greeks_with_price(params, price, Some(&solution.boundary)))
    }

    /// Prices without Greeks, solving the boundary internally.
    ///
    /// # Errors
    /// As for [`BoundaryEngine::price_option`].
    pub fn price(&self, params: &OptionParameters) -> Result<f64, PricingError> {
        params.validate()?;
        if self.uses_closed_form(params) {
            return QdPlus::price(params);
        }
        let solution = self.solve_boundary(params)?;
        self.price_with_boundary(params, &solution.boundary)
    }

    /// Whether the deterministic QD+-only regime applies: at or below the
    /// near-expiry threshold, or at (near-)zero volatility.
    #[inline]
    pub fn uses_closed_form(&self, params: &OptionParameters) -> bool {
        params.maturity <= self.config.near_expiry_threshold
            || params.volatility < MIN_VOLATILITY
    }

    /// Prices against a caller-supplied boundary (typically cached from
    /// [`BoundaryEngine::solve_boundary`] at the same base parameters).
    ///
    /// # Errors
    /// `PricingError::InvalidInput` on invalid parameters;
    /// `PricingError::NumericalInstability` if the premium integral
    /// produces a non-finite value.
    pub fn price_with_boundary(
        &self,
        params: &OptionParameters,
        boundary: &ExerciseBoundary,
    ) -> Result<f64, PricingError> {
        params.validate()?;
        let tau = params.maturity;
        let spot = params.spot;
        let strike = params.strike;
        let bs = BlackScholes::from_params(params);
        let european = bs.price(params.option_type, strike, tau);

        if in_exercise_region(params, boundary) {
            return Ok(params.intrinsic());
        }

        let premium = self.exercise_premium(params, boundary);
        if !premium.is_finite() {
            return Err(PricingError::NumericalInstability(format!(
                "early-exercise premium is not finite for spot {} strike {}",
                spot, strike
            )));
        }
        Ok((european + premium.max(0.0)).max(params.intrinsic()))
    }

    /// Early-exercise premium over the boundary.
    ///
    /// For a put the local gain of being exercised is `rK - qS`; for a
    /// call it is `qS - rK`. Each term is discounted at its own rate and
    /// weighted by the probability of the spot sitting inside the
    /// exercise region, under the cash measure for the strike term
    /// (`d₂` kernel) and the spot measure for the spot term (`d₁`).
    fn exercise_premium(&self, params: &OptionParameters, boundary: &ExerciseBoundary) -> f64 {
        let tau = params.maturity;
        let spot = params.spot;
        let strike = params.strike;
        let rate = params.rate;
        let dividend = params.dividend;
        let vol = params.volatility;
        let is_call = params.option_type.is_call();

        let quad = adaptive(
            |u| {
                let rem = tau - u;
                let upper = boundary.upper().value_at(rem);
                let lower = boundary.lower().map_or(0.0, |c| c.value_at(rem));
                let w1 = region_probability(
                    spot, upper, lower, rate, dividend, vol, u, true, is_call,
                );
                let w2 = region_probability(
                    spot, upper, lower, rate, dividend, vol, u, false, is_call,
                );
                let strike_term = rate * strike * (-rate * u).exp() * w2;
                let spot_term = dividend * spot * (-dividend * u).exp() * w1;
                if is_call {
                    spot_term - strike_term
                } else {
                    strike_term - spot_term
                }
            },
            0.0,
            tau,
            &self.config.quadrature,
        );
        if !quad.converged {
            debug!("premium quadrature hit its subdivision budget");
        }
        quad.value
    }
}

/// Whether the spot is inside the immediate exercise region at the
/// valuation date.
fn in_exercise_region(params: &OptionParameters, boundary: &ExerciseBoundary) -> bool {
    let tau = params.maturity;
    let spot = params.spot;
    let upper = boundary.upper().value_at(tau);
    match (params.option_type, boundary.lower()) {
        (OptionType::Put, None) => upper > 0.0 && spot <= upper,
        (OptionType::Put, Some(lower)) => {
            let lo = lower.value_at(tau);
            upper > 0.0 && lo < upper && spot >= lo && spot <= upper
        }
        (OptionType::Call, None) => upper > 0.0 && spot >= upper,
        (OptionType::Call, Some(lower)) => {
            let lo = lower.value_at(tau);
            lo > 0.0 && lo < upper && spot >= lo && spot <= upper
        }
    }
}

/// d₁ with a boundary value in the strike slot.
#[inline]
fn d1(s: f64, k: f64, rate: f64, dividend: f64, vol: f64, tau: f64) -> f64 {
    ((s / k).ln() + (rate - dividend + 0.5 * vol * vol) * tau) / (vol * tau.sqrt())
}

/// Probability weight of the spot sitting inside the exercise region
/// after time `u`.
///
/// Put region: `[lower, upper]` from below the strike, with `lower == 0`
/// meaning the one-sided region `(0, upper]`. Call region: `[lower,
/// upper]` from above, with `upper == 0` on a single boundary meaning the
/// region `[boundary, ∞)`: the call's single frontier is carried in the
/// `upper` curve, so the band degenerates to `[upper, ∞)` when no lower
/// frontier exists. Degenerate zero frontiers contribute nothing.
#[allow(clippy::too_many_arguments)]
#[inline]
fn region_probability(
    spot: f64,
    upper: f64,
    lower: f64,
    rate: f64,
    dividend: f64,
    vol: f64,
    u: f64,
    spot_measure: bool,
    is_call: bool,
) -> f64 {
    let shift = if spot_measure { 0.0 } else { vol * u.sqrt() };
    let d = |level: f64| d1(spot, level, rate, dividend, vol, u) - shift;
    let p = if is_call {
        // Exercise from above: P(S_u >= inner) - P(S_u >= outer).
        if lower > 0.0 {
            // Band [lower, upper].
            norm_cdf(d(lower)) - if upper > 0.0 { norm_cdf(d(upper)) } else { 0.0 }
        } else if upper > 0.0 {
            // Single frontier [upper, ∞).
            norm_cdf(d(upper))
        } else {
            0.0
        }
    } else {
        // Exercise from below: P(S_u <= upper) - P(S_u <= lower).
        if upper > 0.0 {
            norm_cdf(-d(upper)) - if lower > 0.0 { norm_cdf(-d(lower)) } else { 0.0 }
        } else {
            0.0
        }
    };
    p.max(0.0)
}
