//! Shared value types for the pricing engine.

pub mod error;
pub mod option;

pub use error::{PricingError, SolverError};
pub use option::{
    CalendarSpreadParameters, OptionParameters, OptionPricing, OptionType, SpreadPricing,
};
