//! Finite-difference Greeks with the fail-soft policy.
//!
//! ## Bump conventions
//!
//! - **Delta / gamma**: central differences on spot with the boundary
//!   held fixed. By smooth pasting the option value is insensitive to
//!   first order in the boundary location, so freezing the boundary
//!   keeps first-order spot Greeks accurate while avoiding two extra
//!   solves per pricing.
//! - **Vega / theta / rho**: central (theta: forward) differences that
//!   re-solve the boundary at the bumped input; the boundary moves
//!   materially with volatility, time and rates, so reusing it would
//!   bias these Greeks.
//!
//! ## Fail-soft policy
//!
//! A Greek whose computation fails yields `0.0` for that Greek only,
//! with a warning log; the price and the remaining Greeks are
//! unaffected. This deliberately differs from the solver's own
//! fail-loud policy: a missing sensitivity is business-recoverable, a
//! missing boundary is not.

use amopt_boundary::{ExerciseBoundary, QdPlus};
use amopt_core::types::{OptionParameters, OptionPricing, PricingError};
use tracing::warn;

use crate::engine::{BoundaryEngine, MIN_VOLATILITY};

/// Relative spot bump for delta and gamma.
const SPOT_BUMP_REL: f64 = 1e-3;
/// Absolute volatility bump for vega (one volatility point).
const VOL_BUMP: f64 = 0.01;
/// Theta step: one calendar day in years.
const THETA_STEP: f64 = 1.0 / 365.0;
/// Absolute rate bump for rho (one basis point).
const RATE_BUMP: f64 = 1e-4;

impl BoundaryEngine {
    /// Prices and computes all five Greeks against a caller-supplied
    /// (typically cached) boundary.
    ///
    /// Spot bumps reuse `boundary`; volatility, time and rate bumps
    /// re-solve internally. Failed Greeks yield `0.0` per the fail-soft
    /// policy.
    ///
    /// # Errors
    /// Only the price itself can fail (fail-loud); Greek failures are
    /// absorbed.
    pub fn calculate_greeks(
        &self,
        params: &OptionParameters,
        boundary: &ExerciseBoundary,
    ) -> Result<OptionPricing, PricingError> {
        let price = self.price_with_boundary(params, boundary)?;
        Ok(self.greeks_with_price(params, price, Some(boundary)))
    }

    /// Assembles the pricing record from a computed price and the bump
    /// Greeks. `boundary` is `Some` on the full-solve path (reused for
    /// spot bumps) and `None` on the QD+-only near-expiry path.
    pub(crate) fn greeks_with_price(
        &self,
        params: &OptionParameters,
        price: f64,
        boundary: Option<&ExerciseBoundary>,
    ) -> OptionPricing {
        let (delta, gamma) = self.spot_greeks(params, price, boundary);

        let vega = self.fail_soft("vega", || {
            let hi = params.volatility + VOL_BUMP;
            let lo = (params.volatility - VOL_BUMP).max(MIN_VOLATILITY);
            let p_hi = self.price(&params.with_volatility(hi)?)?;
            let p_lo = self.price(&params.with_volatility(lo)?)?;
            Ok((p_hi - p_lo) / (hi - lo))
        });

        let theta = self.fail_soft("theta", || {
            if params.maturity <= THETA_STEP {
                return Ok(0.0);
            }
            let tomorrow = self.price(&params.with_maturity(params.maturity - THETA_STEP)?)?;
            Ok((tomorrow - price) / THETA_STEP)
        });

        let rho = self.fail_soft("rho", || {
            let p_hi = self.price(&params.with_rate(params.rate + RATE_BUMP)?)?;
            let p_lo = self.price(&params.with_rate(params.rate - RATE_BUMP)?)?;
            Ok((p_hi - p_lo) / (2.0 * RATE_BUMP))
        });

        OptionPricing {
            price,
            delta,
            gamma,
            vega,
            theta,
            rho,
        }
    }

    /// Delta and gamma from central spot bumps against a fixed boundary.
    fn spot_greeks(
        &self,
        params: &OptionParameters,
        price: f64,
        boundary: Option<&ExerciseBoundary>,
    ) -> (f64, f64) {
        let h = params.spot * SPOT_BUMP_REL;
        let up = self.spot_bumped_price(params, params.spot + h, boundary);
        let down = self.spot_bumped_price(params, params.spot - h, boundary);
        match (up, down) {
            (Ok(u), Ok(d)) if u.is_finite() && d.is_finite() => {
                let delta = (u - d) / (2.0 * h);
                // Vanilla gamma is non-negative; the clamp removes
                // finite-difference noise around kinks.
                let gamma = ((u - 2.0 * price + d) / (h * h)).max(0.0);
                (delta, gamma)
            }
            _ => {
                warn!("delta/gamma computation failed, reporting 0.0");
                (0.0, 0.0)
            }
        }
    }

    /// Prices a spot-bumped copy: against the fixed boundary on the
    /// full-solve path, via the QD+ closed form on the near-expiry path.
    fn spot_bumped_price(
        &self,
        params: &OptionParameters,
        new_spot: f64,
        boundary: Option<&ExerciseBoundary>,
    ) -> Result<f64, PricingError> {
        let bumped = params.with_spot(new_spot)?;
        match boundary {
            Some(b) => self.price_with_boundary(&bumped, b),
            None => QdPlus::price(&bumped),
        }
    }

    /// Runs one Greek computation under the fail-soft policy.
    fn fail_soft<F>(&self, greek: &'static str, compute: F) -> f64
    where
        F: FnOnce() -> Result<f64, PricingError>,
    {
        match compute() {
            Ok(value) if value.is_finite() => value,
            Ok(value) => {
                warn!(greek, value, "non-finite greek, reporting 0.0");
                0.0
            }
            Err(error) => {
                warn!(greek, %error, "greek computation failed, reporting 0.0");
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use amopt_core::types::{OptionParameters, OptionType};

    use crate::engine::BoundaryEngine;

    fn priced(option_type: OptionType, spot: f64) -> amopt_core::types::OptionPricing {
        let params =
            OptionParameters::new(spot, 100.0, 0.5, 0.05, 0.02, 0.25, option_type).unwrap();
        BoundaryEngine::with_defaults().price_option(&params).unwrap()
    }

    #[test]
    fn call_delta_within_unit_interval() {
        for spot in [80.0, 100.0, 125.0] {
            let pricing = priced(OptionType::Call, spot);
            assert!(
                (0.0..=1.0).contains(&pricing.delta),
                "spot {}: delta {}",
                spot,
                pricing.delta
            );
        }
        // Deep in the money pushes delta towards one.
        assert!(priced(OptionType::Call, 150.0).delta > 0.9);
    }

    #[test]
    fn put_delta_within_negative_unit_interval() {
        for spot in [80.0, 100.0, 125.0] {
            let pricing = priced(OptionType::Put, spot);
            assert!(
                (-1.0..=0.0).contains(&pricing.delta),
                "spot {}: delta {}",
                spot,
                pricing.delta
            );
        }
        assert!(priced(OptionType::Put, 60.0).delta < -0.9);
    }

    #[test]
    fn gamma_non_negative_both_types() {
        assert!(priced(OptionType::Call, 100.0).gamma >= 0.0);
        assert!(priced(OptionType::Put, 100.0).gamma >= 0.0);
    }

    #[test]
    fn vega_positive_at_the_money() {
        assert!(priced(OptionType::Call, 100.0).vega > 0.0);
        assert!(priced(OptionType::Put, 100.0).vega > 0.0);
    }

    #[test]
    fn theta_negative_for_atm_call() {
        let pricing = priced(OptionType::Call, 100.0);
        assert!(pricing.theta < 0.0, "theta {}", pricing.theta);
    }

    #[test]
    fn rho_signs() {
        assert!(priced(OptionType::Call, 100.0).rho > 0.0);
        assert!(priced(OptionType::Put, 100.0).rho < 0.0);
    }

    #[test]
    fn theta_is_zero_inside_one_day() {
        // Sub-day maturity cannot support the theta step; the documented
        // sentinel is 0.0 while the price itself still computes.
        let params = OptionParameters::new(
            100.0,
            100.0,
            0.5 / 365.0,
            0.05,
            0.0,
            0.25,
            OptionType::Put,
        )
        .unwrap();
        let pricing = BoundaryEngine::with_defaults().price_option(&params).unwrap();
        assert!(pricing.price > 0.0);
        assert_eq!(pricing.theta, 0.0);
    }

    #[test]
    fn calculate_greeks_matches_price_option_on_a_cached_boundary() {
        let engine = BoundaryEngine::with_defaults();
        let params =
            OptionParameters::new(100.0, 100.0, 0.5, 0.05, 0.02, 0.25, OptionType::Put).unwrap();
        let solution = engine.solve_boundary(&params).unwrap();
        let via_cache = engine.calculate_greeks(&params, &solution.boundary).unwrap();
        let direct = engine.price_option(&params).unwrap();
        assert!((via_cache.price - direct.price).abs() < 1e-12);
        assert!((via_cache.delta - direct.delta).abs() < 1e-9);
        assert!((via_cache.vega - direct.vega).abs() < 1e-9);
    }

    #[test]
    fn greeks_agree_with_black_scholes_when_exercise_is_worthless() {
        // American call without dividends is European, so bump Greeks
        // should track the analytic Black-Scholes Greeks.
        let params =
            OptionParameters::new(100.0, 100.0, 0.5, 0.05, 0.0, 0.25, OptionType::Call).unwrap();
        let pricing = BoundaryEngine::with_defaults().price_option(&params).unwrap();
        let bs = amopt_core::math::black_scholes::BlackScholes::from_params(&params);
        assert!((pricing.delta - bs.delta(OptionType::Call, 100.0, 0.5)).abs() < 5e-3);
        assert!((pricing.gamma - bs.gamma(100.0, 0.5)).abs() < 5e-3);
        assert!((pricing.vega - bs.vega(100.0, 0.5)).abs() < 0.5);
    }
}
