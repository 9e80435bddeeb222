//! American implied volatility.
//!
//! Inverts the boundary engine's own price, not a European proxy: the
//! Brent solver brackets the volatility and every trial evaluation runs
//! the full pricing pipeline (boundary solve or near-expiry closed form).

use amopt_core::math::solvers::solve_implied_volatility;
use amopt_core::types::{OptionParameters, PricingError};

use crate::engine::BoundaryEngine;

impl BoundaryEngine {
    /// Implied volatility of an American option from its market price.
    ///
    /// # Errors
    /// - `PricingError::InvalidInput` for an unusable market price
    /// - `SolverError::NoBracket` (wrapped) when the configured bracket
    ///   does not straddle the market price; widen the bracket in the
    ///   engine configuration and retry
    /// - `SolverError::MaxIterationsExceeded` (wrapped) when the root
    ///   finder runs out of budget; never a stale default
    pub fn implied_volatility(
        &self,
        market_price: f64,
        params: &OptionParameters,
    ) -> Result<f64, PricingError> {
        params.validate()?;
        if !market_price.is_finite() || market_price <= 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "market price must be positive and finite, got {}",
                market_price
            )));
        }
        let (lower, upper) = self.config().iv_bracket;
        let price_fn = |vol: f64| {
            params
                .with_volatility(vol)
                .and_then(|p| self.price(&p))
                .unwrap_or(f64::NAN)
        };
        solve_implied_volatility(
            price_fn,
            market_price,
            lower,
            upper,
            &self.config().iv_solver,
        )
        .map_err(Into::into)
    }
}
