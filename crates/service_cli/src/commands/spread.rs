//! Calendar-spread command implementation.

use tracing::info;

use amopt_core::types::{CalendarSpreadParameters, OptionType};
use amopt_pricing::{BoundaryEngine, EngineConfig};

use crate::{CliError, Result};

/// Prices a calendar spread and prints per-leg plus net values.
#[allow(clippy::too_many_arguments)]
pub fn run(
    engine_config: EngineConfig,
    spot: f64,
    strike: f64,
    front_maturity: f64,
    back_maturity: f64,
    rate: f64,
    dividend: f64,
    front_volatility: f64,
    back_volatility: f64,
    option_type: OptionType,
    format: &str,
) -> Result<()> {
    let params = CalendarSpreadParameters::new(
        spot,
        strike,
        front_maturity,
        back_maturity,
        rate,
        dividend,
        front_volatility,
        back_volatility,
        option_type,
    )?;
    info!(?option_type, strike, front_maturity, back_maturity, "pricing calendar spread");

    let engine = BoundaryEngine::new(engine_config);
    let pricing = engine.price_calendar_spread(&params)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&pricing)?),
        "table" => {
            println!("\n┌────────────┬──────────────┬──────────────┬──────────────┐");
            println!("│            │ Front        │ Back         │ Net          │");
            println!("├────────────┼──────────────┼──────────────┼──────────────┤");
            println!(
                "│ Price      │ {:>12.6} │ {:>12.6} │ {:>12.6} │",
                pricing.front.price, pricing.back.price, pricing.price
            );
            println!(
                "│ Delta      │ {:>12.6} │ {:>12.6} │ {:>12.6} │",
                pricing.front.delta, pricing.back.delta, pricing.delta
            );
            println!(
                "│ Vega       │ {:>12.6} │ {:>12.6} │ {:>12.6} │",
                pricing.front.vega, pricing.back.vega, pricing.vega
            );
            println!(
                "│ Theta      │ {:>12.6} │ {:>12.6} │ {:>12.6} │",
                pricing.front.theta, pricing.back.theta, pricing.theta
            );
            println!("└────────────┴──────────────┴──────────────┴──────────────┘");
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
