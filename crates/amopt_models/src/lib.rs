//! # amopt_models: Auxiliary Pricing Models
//!
//! Semi-analytical cross-check models sharing the numerical core:
//! currently the Heston (1993) stochastic-volatility pricer, used to
//! cross-validate the boundary engine's volatility inputs and for
//! volatility-surface calibration contexts. Not part of the primary
//! boundary-solver path.

pub mod heston;

pub use heston::{heston_implied_vol, heston_price, HestonError, HestonParameters};
