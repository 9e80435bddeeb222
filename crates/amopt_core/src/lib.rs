//! # amopt_core: Numerical Foundation for American-Option Pricing
//!
//! ## Foundation Layer Role
//!
//! amopt_core is the bottom layer of the engine, providing:
//! - Value types shared across the workspace (`types::option`)
//! - Error taxonomy: `PricingError`, `SolverError` (`types::error`)
//! - Normal-distribution helpers (`math::distributions`)
//! - Black-Scholes analytical model with continuous dividend yield
//!   (`math::black_scholes`)
//! - Brent's-method root finding and implied-volatility solving
//!   (`math::solvers`)
//! - Adaptive Gauss-Kronrod quadrature for finite and semi-infinite
//!   integrals (`math::quadrature`)
//!
//! ## Zero Dependency Principle
//!
//! The foundation layer depends on no other amopt_* crate and keeps its
//! external surface minimal:
//! - num-traits: generic floating-point traits for the distribution helpers
//! - thiserror: structured error types
//! - serde: serialisation of value types for caller-owned caches
//!
//! ## Usage Examples
//!
//! ```rust
//! use amopt_core::math::distributions::norm_cdf;
//! use amopt_core::types::{OptionParameters, OptionType};
//!
//! let params = OptionParameters::new(
//!     100.0, 100.0, 0.25, 0.05, 0.02, 0.30, OptionType::Call,
//! ).unwrap();
//! assert_eq!(params.option_type, OptionType::Call);
//!
//! let p = norm_cdf(0.0_f64);
//! assert!((p - 0.5).abs() < 1e-7);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod math;
pub mod types;
