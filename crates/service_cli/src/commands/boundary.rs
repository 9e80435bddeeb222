//! Boundary command implementation.

use tracing::info;

use amopt_core::types::{OptionParameters, OptionType};
use amopt_pricing::{BoundaryEngine, EngineConfig};

use crate::Result;

/// Solves the early-exercise boundary and prints it as JSON, together
/// with the solve diagnostics on stderr via tracing.
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
) -> Result<()> {
    let params = OptionParameters::new(
        spot, strike, maturity, rate, dividend, volatility, option_type,
    )?;
    let engine = BoundaryEngine::new(engine_config);
    let solution = engine.solve_boundary(&params)?;

    info!(
        regime = ?solution.regime,
        status = ?solution.status,
        fallback_points = solution.fallback_points,
        "boundary solved"
    );
    println!("{}", serde_json::to_string_pretty(&solution.boundary)?);
    Ok(())
}
