//! Heston cross-check command implementation.

use tracing::info;

use amopt_models::{heston_implied_vol, heston_price, HestonParameters};
use amopt_pricing::EngineConfig;

use crate::Result;

/// Prices a European option under the Heston model and reports the
/// Black-Scholes volatility it implies, the cross-check against the
/// boundary engine's volatility input.
#[allow(clippy::too_many_arguments)]
pub fn run(
    _engine_config: EngineConfig,
    spot: f64,
    strike: f64,
    maturity: f64,
    rate: f64,
    dividend: f64,
    kappa: f64,
    theta: f64,
    sigma_v: f64,
    rho: f64,
    v0: f64,
    is_call: bool,
) -> Result<()> {
    let params = HestonParameters::new(kappa, theta, sigma_v, rho, v0, rate, dividend)
        .map_err(amopt_core::types::PricingError::from)?;
    if !params.satisfies_feller() {
        info!(
            feller_ratio = params.feller_ratio(),
            "Feller condition violated; variance can reach zero"
        );
    }

    let price = heston_price(spot, strike, maturity, &params, is_call)
        .map_err(amopt_core::types::PricingError::from)?;
    let implied = heston_implied_vol(spot, strike, maturity, &params, is_call)?;

    println!("heston price:       {:.6}", price);
    println!("implied volatility: {:.6}", implied);
    Ok(())
}
