//! Price command implementation.

use tracing::info;

use amopt_core::types::{OptionParameters, OptionType};
use amopt_pricing::{BoundaryEngine, EngineConfig};

use crate::{CliError, Result};

/// Prices one American option and prints the result.
#[allow(clippy::too_many_arguments)]
pub fn run(
    engine_config: EngineConfig,
    spot: f64,
    strike: f64,
    maturity: f64,
    rate: f64,
    dividend: f64,
    volatility: f64,
    option_type: OptionType,
    format: &str,
) -> Result<()> {
    let params = OptionParameters::new(
        spot, strike, maturity, rate, dividend, volatility, option_type,
    )?;
    info!(?option_type, spot, strike, maturity, "pricing option");

    let engine = BoundaryEngine::new(engine_config);
    let pricing = engine.price_option(&params)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&pricing)?),
        "table" => {
            println!("\n┌────────────┬──────────────┐");
            println!("│ Price      │ {:>12.6} │", pricing.price);
            println!("├────────────┼──────────────┤");
            println!("│ Delta      │ {:>12.6} │", pricing.delta);
            println!("│ Gamma      │ {:>12.6} │", pricing.gamma);
            println!("│ Vega       │ {:>12.6} │", pricing.vega);
            println!("│ Theta      │ {:>12.6} │", pricing.theta);
            println!("│ Rho        │ {:>12.6} │", pricing.rho);
            println!("└────────────┴──────────────┘");
        }
        other => {
            return Err(CliError::InvalidArgument(format!(
                "unknown format: {}. Supported: json, table",
                other
            )));
        }
    }
    Ok(())
}
