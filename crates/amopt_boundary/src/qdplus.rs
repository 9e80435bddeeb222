//! QD+ closed-form approximation of the early-exercise boundary.
//!
//! A Barone-Adesi/Whaley-family quadratic approximation, extended so the
//! characteristic-equation root stays real under negative rates (the
//! `m/h` ratio is positive for every non-zero rate and is continued
//! analytically through `r = 0`). Two uses:
//!
//! - iteration-free boundary seeds for the Kim solver, one value per
//!   collocation time;
//! - the QD+-only closed-form price the engine switches to inside the
//!   near-expiry window, where the integral representation is
//!   ill-conditioned.
//!
//! Everything below works in put coordinates; the public entry points
//! route calls through the put-call symmetry dual.

use amopt_core::math::black_scholes::BlackScholes;
use amopt_core::math::distributions::{norm_cdf, norm_pdf};
use amopt_core::types::{OptionParameters, OptionType, PricingError};

use crate::boundary::{BoundaryCurve, ExerciseBoundary};
use crate::collocation::CollocationGrid;

/// Exercise regime implied by the signs of rate and dividend yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseRegime {
    /// One exercise frontier (the standard American option).
    Single,
    /// An exercise band with lower and upper frontiers (negative rates).
    Double,
    /// Early exercise is never optimal; the American value equals the
    /// European value.
    NoEarlyExercise,
}

/// QD+ approximation entry points.
#[derive(Debug, Clone, Copy)]
pub struct QdPlus;

/// Newton refinement budget for the critical price in QD+ pricing.
const CRITICAL_PRICE_ITERATIONS: usize = 50;

impl QdPlus {
    /// Exercise regime for a put with the given (signed) rate and
    /// dividend yield.
    ///
    /// - `r > 0`, or `r == 0` with `q < 0`: single frontier;
    /// - `q < r < 0`: exercise band (the local gain of being exercised,
    ///   `rK - qS`, is positive only on an interior spot range);
    /// - otherwise the local gain is nowhere positive inside the payoff
    ///   region and early exercise is never optimal.
    pub fn put_regime(rate: f64, dividend: f64) -> ExerciseRegime {
        if rate > 0.0 {
            ExerciseRegime::Single
        } else if rate == 0.0 {
            if dividend < 0.0 {
                ExerciseRegime::Single
            } else {
                ExerciseRegime::NoEarlyExercise
            }
        } else if dividend < rate {
            ExerciseRegime::Double
        } else {
            ExerciseRegime::NoEarlyExercise
        }
    }

    /// Exercise regime for arbitrary parameters (calls via the symmetry
    /// dual).
    pub fn regime(params: &OptionParameters) -> ExerciseRegime {
        match params.option_type {
            OptionType::Put => Self::put_regime(params.rate, params.dividend),
            OptionType::Call => Self::put_regime(params.dividend, params.rate),
        }
    }

    /// Terminal (tau -> 0) limit of the put's upper frontier:
    /// `K·min(1, r/q)` under positive dividend yield, `K` otherwise.
    pub(crate) fn put_terminal_upper(strike: f64, rate: f64, dividend: f64) -> f64 {
        if dividend > 0.0 {
            strike * (rate / dividend).clamp(0.0, 1.0)
        } else {
            strike
        }
    }

    /// Terminal limit of the put's lower frontier in the band regime:
    /// `K·(r/q)` with `q < r < 0`.
    pub(crate) fn put_terminal_lower(strike: f64, rate: f64, dividend: f64) -> f64 {
        strike * (rate / dividend)
    }

    /// Negative root of the QD+ characteristic quadratic
    /// `λ² + (n-1)λ - m/h = 0`.
    ///
    /// `m/h = (2r/σ²)/(1 - e^{-rτ})` is positive for every `r != 0` and
    /// tends to `2/(σ²τ)` as `r -> 0`, so the discriminant never goes
    /// negative, which keeps the approximation usable under
    /// negative rates.
    fn put_lambda(rate: f64, dividend: f64, vol: f64, tau: f64) -> f64 {
        let sigma2 = vol * vol;
        let n = 2.0 * (rate - dividend) / sigma2;
        let m_over_h = if rate.abs() < 1e-12 {
            2.0 / (sigma2 * tau)
        } else {
            (2.0 * rate / sigma2) / (1.0 - (-rate * tau).exp())
        };
        0.5 * (-(n - 1.0) - ((n - 1.0) * (n - 1.0) + 4.0 * m_over_h).sqrt())
    }

    /// Closed-form seed for the put's upper frontier at one collocation
    /// time. No iteration.
    pub(crate) fn put_upper_seed(
        strike: f64,
        rate: f64,
        dividend: f64,
        vol: f64,
        tau: f64,
    ) -> f64 {
        let terminal = Self::put_terminal_upper(strike, rate, dividend);
        if tau <= 0.0 {
            return terminal;
        }
        let lambda = Self::put_lambda(rate, dividend, vol, tau);
        let s_inf = strike / (1.0 - 2.0 / lambda);
        let h = ((rate - dividend) * tau - 2.0 * vol * tau.sqrt()) * strike / (strike - s_inf);
        let seed = s_inf + (strike - s_inf) * h.exp();
        seed.min(terminal).max(terminal * 1e-3)
    }

    /// Closed-form seed for the put's lower frontier in the band regime.
    ///
    /// Grows from the terminal limit `K·r/q` as `exp(σ√τ)` and is capped
    /// at the upper seed; a capped point marks an empty band at that
    /// collocation time.
    pub(crate) fn put_lower_seed(
        strike: f64,
        rate: f64,
        dividend: f64,
        vol: f64,
        tau: f64,
        upper_seed: f64,
    ) -> f64 {
        let terminal = Self::put_terminal_lower(strike, rate, dividend);
        if tau <= 0.0 {
            return terminal.min(upper_seed);
        }
        let seed = terminal * (vol * tau.sqrt()).exp();
        seed.clamp(0.0, upper_seed)
    }

    /// Seed arrays for the solver's working buffers, in put coordinates.
    ///
    /// Returns the regime plus `upper` and `lower` values aligned with
    /// the grid. `lower` is identically zero outside the band regime;
    /// both arrays are zero when early exercise is never optimal.
    pub(crate) fn put_seed_arrays(
        strike: f64,
        rate: f64,
        dividend: f64,
        vol: f64,
        grid: &CollocationGrid,
    ) -> (ExerciseRegime, Vec<f64>, Vec<f64>) {
        let regime = Self::put_regime(rate, dividend);
        let n = grid.len();
        match regime {
            ExerciseRegime::NoEarlyExercise => (regime, vec![0.0; n], vec![0.0; n]),
            ExerciseRegime::Single => {
                let upper = grid
                    .taus()
                    .iter()
                    .map(|&tau| Self::put_upper_seed(strike, rate, dividend, vol, tau))
                    .collect();
                (regime, upper, vec![0.0; n])
            }
            ExerciseRegime::Double => {
                let upper: Vec<f64> = grid
                    .taus()
                    .iter()
                    .map(|&tau| Self::put_upper_seed(strike, rate, dividend, vol, tau))
                    .collect();
                let lower = grid
                    .taus()
                    .iter()
                    .zip(&upper)
                    .map(|(&tau, &u)| Self::put_lower_seed(strike, rate, dividend, vol, tau, u))
                    .collect();
                (regime, upper, lower)
            }
        }
    }

    /// Initial exercise boundary at each collocation time.
    ///
    /// Pure and iteration-free, O(collocation count). Detects the regime
    /// from the signs of rate and dividend and returns the matching
    /// variant; calls are seeded through the symmetry dual and mapped
    /// back into call coordinates.
    ///
    /// # Errors
    /// `PricingError::InvalidInput` for invalid parameters or a
    /// volatility too small to support a boundary representation.
    pub fn initial_boundaries(
        params: &OptionParameters,
        grid: &CollocationGrid,
    ) -> Result<ExerciseBoundary, PricingError> {
        params.validate()?;
        if params.volatility < 1e-8 {
            return Err(PricingError::InvalidInput(format!(
                "volatility {} too small for a boundary representation",
                params.volatility
            )));
        }
        match params.option_type {
            OptionType::Put => Self::initial_put_boundary(params, grid),
            OptionType::Call => {
                let dual = params.symmetric_dual();
                let put = Self::initial_put_boundary(&dual, grid)?;
                Ok(put.symmetric_map(params.strike * params.spot))
            }
        }
    }

    fn initial_put_boundary(
        params: &OptionParameters,
        grid: &CollocationGrid,
    ) -> Result<ExerciseBoundary, PricingError> {
        let (regime, upper, lower) = Self::put_seed_arrays(
            params.strike,
            params.rate,
            params.dividend,
            params.volatility,
            grid,
        );
        let taus = grid.taus().to_vec();
        match regime {
            ExerciseRegime::Double => ExerciseBoundary::double(
                BoundaryCurve::new(taus.clone(), lower)?,
                BoundaryCurve::new(taus, upper)?,
            ),
            _ => Ok(ExerciseBoundary::Single(BoundaryCurve::new(taus, upper)?)),
        }
    }

    /// QD+-only American price: European value plus the quadratic
    /// early-exercise premium.
    ///
    /// This is the deterministic pricing path for the near-expiry window;
    /// it never invokes the integral solver.
    ///
    /// # Errors
    /// `PricingError::InvalidInput` for invalid parameters.
    pub fn price(params: &OptionParameters) -> Result<f64, PricingError> {
        params.validate()?;
        match params.option_type {
            OptionType::Put => Ok(Self::put_price(params)),
            OptionType::Call => Ok(Self::put_price(&params.symmetric_dual())),
        }
    }

    fn put_price(params: &OptionParameters) -> f64 {
        let (spot, strike, tau) = (params.spot, params.strike, params.maturity);
        let (rate, dividend, vol) = (params.rate, params.dividend, params.volatility);
        let bs = BlackScholes::from_params(params);
        let european = bs.price_put(strike, tau);
        if vol < 1e-8 {
            return european.max(strike - spot);
        }

        match Self::put_regime(rate, dividend) {
            ExerciseRegime::NoEarlyExercise => european,
            ExerciseRegime::Single => {
                let lambda = Self::put_lambda(rate, dividend, vol, tau);
                let s_star = Self::put_critical_price(strike, rate, dividend, vol, tau, lambda);
                if spot <= s_star {
                    strike - spot
                } else {
                    let d1_star = BlackScholes::new(s_star, rate, dividend, vol)
                        .map(|m| m.d1(strike, tau))
                        .unwrap_or(0.0);
                    let a1 = -(s_star / lambda)
                        * (1.0 - (-dividend * tau).exp() * norm_cdf(-d1_star));
                    european + a1 * (spot / s_star).powf(lambda)
                }
            }
            ExerciseRegime::Double => {
                // Inside the band intrinsic dominates; outside it the
                // O(sqrt(tau)) premium is dropped, which is why this path
                // only serves the near-expiry window.
                let upper = Self::put_upper_seed(strike, rate, dividend, vol, tau);
                let lower = Self::put_lower_seed(strike, rate, dividend, vol, tau, upper);
                if spot >= lower && spot <= upper {
                    (strike - spot).max(european)
                } else {
                    european
                }
            }
        }
    }

    /// Critical put price via Newton refinement of the QD+ value-matching
    /// condition (bounded iteration, used in pricing only; the boundary
    /// seeds stay closed-form).
    fn put_critical_price(
        strike: f64,
        rate: f64,
        dividend: f64,
        vol: f64,
        tau: f64,
        lambda: f64,
    ) -> f64 {
        let mut si = Self::put_upper_seed(strike, rate, dividend, vol, tau);
        let sqrt_tau = tau.sqrt();
        let discount_q = (-dividend * tau).exp();

        for _ in 0..CRITICAL_PRICE_ITERATIONS {
            let bs = match BlackScholes::new(si, rate, dividend, vol) {
                Ok(model) => model,
                Err(_) => break,
            };
            let put = bs.price_put(strike, tau);
            let d1 = bs.d1(strike, tau);
            let n_md1 = norm_cdf(-d1);
            let phi_d1 = norm_pdf(d1);

            let a1 = -(si / lambda) * (1.0 - discount_q * n_md1);
            let g = (strike - si) - put - a1;
            if g.abs() < 1e-10 * strike {
                break;
            }

            let delta_put = -discount_q * n_md1;
            let da1 = -(1.0 / lambda) * (1.0 - discount_q * n_md1)
                - discount_q * phi_d1 / (lambda * vol * sqrt_tau);
            let gp = -1.0 - delta_put - da1;
            if gp.abs() < 1e-14 {
                break;
            }

            si -= g / gp;
            si = si.clamp(strike * 1e-6, strike * 0.9999);
        }
        si
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(spot: f64, rate: f64, dividend: f64, tau: f64) -> OptionParameters {
        OptionParameters::new(spot, 100.0, tau, rate, dividend, 0.25, OptionType::Put).unwrap()
    }

    #[test]
    fn regime_detection_put() {
        assert_eq!(QdPlus::put_regime(0.05, 0.02), ExerciseRegime::Single);
        assert_eq!(QdPlus::put_regime(0.05, -0.02), ExerciseRegime::Single);
        assert_eq!(QdPlus::put_regime(0.0, -0.02), ExerciseRegime::Single);
        assert_eq!(QdPlus::put_regime(-0.01, -0.05), ExerciseRegime::Double);
        assert_eq!(QdPlus::put_regime(-0.03, 0.01), ExerciseRegime::NoEarlyExercise);
        assert_eq!(QdPlus::put_regime(0.0, 0.02), ExerciseRegime::NoEarlyExercise);
        assert_eq!(QdPlus::put_regime(-0.05, -0.01), ExerciseRegime::NoEarlyExercise);
    }

    #[test]
    fn regime_detection_call_swaps_roles() {
        let call = OptionParameters::new(100.0, 100.0, 1.0, 0.05, 0.02, 0.2, OptionType::Call)
            .unwrap();
        assert_eq!(QdPlus::regime(&call), ExerciseRegime::Single);
        // Call on a non-dividend stock: never exercised early.
        let call = call.with_rate(0.05).unwrap();
        let mut no_div = call;
        no_div.dividend = 0.0;
        assert_eq!(QdPlus::regime(&no_div), ExerciseRegime::NoEarlyExercise);
        // Call band regime: r < q < 0.
        let mut band = call;
        band.rate = -0.05;
        band.dividend = -0.01;
        assert_eq!(QdPlus::regime(&band), ExerciseRegime::Double);
    }

    #[test]
    fn terminal_limits() {
        // r < q, both positive: K·r/q.
        assert!((QdPlus::put_terminal_upper(100.0, 0.02, 0.05) - 40.0).abs() < 1e-12);
        // r >= q > 0: K.
        assert!((QdPlus::put_terminal_upper(100.0, 0.05, 0.02) - 100.0).abs() < 1e-12);
        // q <= 0: K.
        assert!((QdPlus::put_terminal_upper(100.0, 0.05, -0.01) - 100.0).abs() < 1e-12);
        // Band regime lower limit: K·r/q with q < r < 0.
        assert!((QdPlus::put_terminal_lower(100.0, -0.01, -0.05) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn upper_seed_below_terminal_and_decreasing() {
        let mut prev = QdPlus::put_terminal_upper(100.0, 0.05, 0.0);
        for tau in [0.01, 0.05, 0.25, 1.0, 2.0] {
            let seed = QdPlus::put_upper_seed(100.0, 0.05, 0.0, 0.25, tau);
            assert!(seed > 0.0 && seed <= prev + 1e-9, "tau {}: {}", tau, seed);
            prev = seed;
        }
    }

    #[test]
    fn upper_seed_finite_under_negative_rates() {
        for tau in [0.05, 0.5, 2.0] {
            let seed = QdPlus::put_upper_seed(100.0, -0.01, -0.05, 0.2, tau);
            assert!(seed.is_finite() && seed > 0.0 && seed <= 100.0);
        }
    }

    #[test]
    fn lower_seed_stays_below_upper() {
        for tau in [0.05, 0.5, 2.0, 10.0] {
            let upper = QdPlus::put_upper_seed(100.0, -0.01, -0.05, 0.2, tau);
            let lower = QdPlus::put_lower_seed(100.0, -0.01, -0.05, 0.2, tau, upper);
            assert!(lower >= 0.0 && lower <= upper, "tau {}", tau);
        }
    }

    #[test]
    fn initial_boundaries_single_regime() {
        let grid = CollocationGrid::new(0.5, 12).unwrap();
        let boundary = QdPlus::initial_boundaries(&put(100.0, 0.05, 0.02, 0.5), &grid).unwrap();
        assert!(!boundary.is_double());
        assert_eq!(boundary.upper().values().len(), 12);
        assert!((boundary.upper().terminal_value() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn initial_boundaries_double_regime() {
        let grid = CollocationGrid::new(0.5, 12).unwrap();
        let boundary = QdPlus::initial_boundaries(&put(50.0, -0.01, -0.05, 0.5), &grid).unwrap();
        assert!(boundary.is_double());
        let lower = boundary.lower().unwrap();
        for (lo, hi) in lower.values().iter().zip(boundary.upper().values()) {
            assert!(lo <= hi);
        }
        assert!((lower.terminal_value() - 20.0).abs() < 1e-9);
        assert!((boundary.upper().terminal_value() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn qd_price_at_least_european_put() {
        let params = put(90.0, 0.05, 0.0, 0.5);
        let european = BlackScholes::from_params(&params).price_put(100.0, 0.5);
        let american = QdPlus::price(&params).unwrap();
        assert!(american >= european - 1e-9, "{} < {}", american, european);
    }

    #[test]
    fn qd_price_deep_itm_put_is_intrinsic() {
        let params = put(40.0, 0.08, 0.0, 0.5);
        let price = QdPlus::price(&params).unwrap();
        assert!((price - 60.0).abs() < 1e-9);
    }

    #[test]
    fn qd_price_no_exercise_equals_european() {
        // r < 0, q >= 0: the American put collapses to the European one.
        let params = put(100.0, -0.02, 0.01, 0.5);
        let european = BlackScholes::from_params(&params).price_put(100.0, 0.5);
        let price = QdPlus::price(&params).unwrap();
        assert!((price - european).abs() < 1e-12);
    }

    #[test]
    fn qd_call_on_non_dividend_stock_is_european() {
        let call =
            OptionParameters::new(100.0, 100.0, 1.0, 0.05, 0.0, 0.2, OptionType::Call).unwrap();
        let european = BlackScholes::from_params(&call).price_call(100.0, 1.0);
        let price = QdPlus::price(&call).unwrap();
        assert!((price - european).abs() < 1e-9);
    }

    #[test]
    fn critical_price_satisfies_value_matching() {
        let (strike, rate, dividend, vol, tau) = (100.0, 0.05, 0.0, 0.25, 0.5);
        let lambda = QdPlus::put_lambda(rate, dividend, vol, tau);
        let s_star = QdPlus::put_critical_price(strike, rate, dividend, vol, tau, lambda);
        assert!(s_star > 0.0 && s_star < strike);
        let bs = BlackScholes::new(s_star, rate, dividend, vol).unwrap();
        let a1 = -(s_star / lambda)
            * (1.0 - (-dividend * tau).exp() * norm_cdf(-bs.d1(strike, tau)));
        let residual = (strike - s_star) - bs.price_put(strike, tau) - a1;
        assert!(residual.abs() < 1e-6, "residual = {}", residual);
    }
}
