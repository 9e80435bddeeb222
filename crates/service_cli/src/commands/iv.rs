//! Implied-volatility command implementation.

use tracing::info;

use amopt_core::types::{OptionParameters, OptionType};
use amopt_pricing::{BoundaryEngine, EngineConfig};

use crate::Result;

/// Backs out the implied volatility reproducing a market price.
#[allow(clippy::too_many_arguments)]
pub fn run(
    engine_config: EngineConfig,
    market_price: f64,
    spot: f64,
    strike: f64,
    maturity: f64,
    rate: f64,
    dividend: f64,
    option_type: OptionType,
) -> Result<()> {
    // The volatility slot is a placeholder; the solver owns it.
    let params = OptionParameters::new(spot, strike, maturity, rate, dividend, 0.2, option_type)?;
    info!(?option_type, market_price, strike, "solving implied volatility");

    let engine = BoundaryEngine::new(engine_config);
    let vol = engine.implied_volatility(market_price, &params)?;
    println!("implied volatility: {:.6}", vol);
    Ok(())
}
