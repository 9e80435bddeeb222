//! CLI error type.

use amopt_core::types::PricingError;
use thiserror::Error;

/// Errors surfaced to the command line.
#[derive(Error, Debug)]
pub enum CliError {
    /// An argument failed validation beyond what clap checks.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Pricing-engine failure.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Output serialisation failure.
    #[error("serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

/// CLI result alias.
pub type Result<T> = std::result::Result<T, CliError>;
