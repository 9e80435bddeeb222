//! Amopt CLI - command-line operations for the American-option pricing
//! engine.
//!
//! # Commands
//!
//! - `amopt price` - price one American option with Greeks
//! - `amopt spread` - price a calendar spread
//! - `amopt iv` - back out implied volatility from a market price
//! - `amopt boundary` - solve and dump the early-exercise boundary
//!
//! Solver settings can be overridden from a TOML file passed with
//! `--config`; defaults apply when the file is absent.

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use amopt_core::types::OptionType;

/// Amopt pricing engine CLI.
#[derive(Parser)]
#[command(name = "amopt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "amopt.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

/// Call/put selector for the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Side {
    /// Call option.
    Call,
    /// Put option.
    Put,
}

impl From<Side> for OptionType {
    fn from(side: Side) -> Self {
        match side {
            Side::Call => OptionType::Call,
            Side::Put => OptionType::Put,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Price one American option with Greeks
    Price {
        /// Spot price of the underlying
        #[arg(long)]
        spot: f64,

        /// Strike price
        #[arg(long)]
        strike: f64,

        /// Time to expiry in years
        #[arg(long)]
        maturity: f64,

        /// Risk-free rate (signed, continuously compounded)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        rate: f64,

        /// Dividend yield (signed, continuous)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        dividend: f64,

        /// Implied volatility
        #[arg(long)]
        volatility: f64,

        /// Call or put
        #[arg(long, value_enum, default_value_t = Side::Call)]
        side: Side,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Price a calendar spread (short front leg, long back leg)
    Spread {
        /// Spot price of the underlying
        #[arg(long)]
        spot: f64,

        /// Shared strike price
        #[arg(long)]
        strike: f64,

        /// Front-leg expiry in years
        #[arg(long)]
        front_maturity: f64,

        /// Back-leg expiry in years
        #[arg(long)]
        back_maturity: f64,

        /// Risk-free rate (signed)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        rate: f64,

        /// Dividend yield (signed)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        dividend: f64,

        /// Front-leg implied volatility
        #[arg(long)]
        front_volatility: f64,

        /// Back-leg implied volatility
        #[arg(long)]
        back_volatility: f64,

        /// Call or put (both legs)
        #[arg(long, value_enum, default_value_t = Side::Call)]
        side: Side,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Back out implied volatility from a market price
    Iv {
        /// Observed market price
        #[arg(long)]
        market_price: f64,

        /// Spot price of the underlying
        #[arg(long)]
        spot: f64,

        /// Strike price
        #[arg(long)]
        strike: f64,

        /// Time to expiry in years
        #[arg(long)]
        maturity: f64,

        /// Risk-free rate (signed)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        rate: f64,

        /// Dividend yield (signed)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        dividend: f64,

        /// Call or put
        #[arg(long, value_enum, default_value_t = Side::Call)]
        side: Side,
    },

    /// Price a European option under the Heston model (cross-check)
    Heston {
        /// Spot price of the underlying
        #[arg(long)]
        spot: f64,

        /// Strike price
        #[arg(long)]
        strike: f64,

        /// Time to expiry in years
        #[arg(long)]
        maturity: f64,

        /// Risk-free rate (signed)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        rate: f64,

        /// Dividend yield (signed)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        dividend: f64,

        /// Mean-reversion speed of the variance process
        #[arg(long)]
        kappa: f64,

        /// Long-run variance
        #[arg(long)]
        theta: f64,

        /// Volatility of variance
        #[arg(long)]
        sigma_v: f64,

        /// Spot-variance correlation
        #[arg(long, allow_negative_numbers = true)]
        rho: f64,

        /// Initial variance
        #[arg(long)]
        v0: f64,

        /// Call or put
        #[arg(long, value_enum, default_value_t = Side::Call)]
        side: Side,
    },

    /// Solve and print the early-exercise boundary as JSON
    Boundary {
        /// Spot price of the underlying
        #[arg(long)]
        spot: f64,

        /// Strike price
        #[arg(long)]
        strike: f64,

        /// Time to expiry in years
        #[arg(long)]
        maturity: f64,

        /// Risk-free rate (signed)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        rate: f64,

        /// Dividend yield (signed)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        dividend: f64,

        /// Implied volatility
        #[arg(long)]
        volatility: f64,

        /// Call or put
        #[arg(long, value_enum, default_value_t = Side::Put)]
        side: Side,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if cli.verbose {
        info!("verbose mode enabled");
    }
    let engine_config = config::load(&cli.config)?.engine_config();

    match cli.command {
        Commands::Price {
            spot,
            strike,
            maturity,
            rate,
            dividend,
            volatility,
            side,
            format,
        } => commands::price::run(
            engine_config,
            spot,
            strike,
            maturity,
            rate,
            dividend,
            volatility,
            side.into(),
            &format,
        ),
        Commands::Spread {
            spot,
            strike,
            front_maturity,
            back_maturity,
            rate,
            dividend,
            front_volatility,
            back_volatility,
            side,
            format,
        } => commands::spread::run(
            engine_config,
            spot,
            strike,
            front_maturity,
            back_maturity,
            rate,
            dividend,
            front_volatility,
            back_volatility,
            side.into(),
            &format,
        ),
        Commands::Iv {
            market_price,
            spot,
            strike,
            maturity,
            rate,
            dividend,
            side,
        } => commands::iv::run(
            engine_config,
            market_price,
            spot,
            strike,
            maturity,
            rate,
            dividend,
            side.into(),
        ),
        Commands::Heston {
            spot,
            strike,
            maturity,
            rate,
            dividend,
            kappa,
            theta,
            sigma_v,
            rho,
            v0,
            side,
        } => commands::heston::run(
            engine_config,
            spot,
            strike,
            maturity,
            rate,
            dividend,
            kappa,
            theta,
            sigma_v,
            rho,
            v0,
            matches!(side, Side::Call),
        ),
        Commands::Boundary {
            spot,
            strike,
            maturity,
            rate,
            dividend,
            volatility,
            side,
        } => commands::boundary::run(
            engine_config,
            spot,
            strike,
            maturity,
            rate,
            dividend,
            volatility,
            side.into(),
        ),
    }
}
