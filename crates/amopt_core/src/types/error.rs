//! Error types for structured error handling.
//!
//! This module provides:
//! - `PricingError`: errors from pricing operations
//! - `SolverError`: errors from root finding and the boundary solver
//!
//! The two types encode the engine's propagation policy: invalid inputs and
//! solver failures are fatal to the current pricing request and surfaced to
//! the caller; per-Greek computation failures are downgraded to a sentinel
//! at the Greeks-engine call site and never reach these types.

use thiserror::Error;

/// Categorised pricing errors.
///
/// # Variants
/// - `InvalidInput`: invalid market data or parameters, surfaced
///   immediately and never recovered internally
/// - `NumericalInstability`: a computation produced a non-finite or
///   inadmissible value
/// - `Solver`: a root-finding or boundary-solve failure, forwarded intact
///   so callers can match on the underlying [`SolverError`]
///
/// # Examples
/// ```
/// use amopt_core::types::PricingError;
///
/// let err = PricingError::InvalidInput("spot must be positive".to_string());
/// assert_eq!(format!("{}", err), "invalid input: spot must be positive");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    /// Invalid input data or parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Numerical instability during computation.
    #[error("numerical instability: {0}")]
    NumericalInstability(String),

    /// Root-finding or boundary-solver failure.
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Root-finding and boundary-solver errors.
///
/// # Variants
/// - `MaxIterationsExceeded`: the iteration budget ran out before the
///   tolerance was met; distinct from invalid input so callers can choose
///   to accept a best-effort result
/// - `NoBracket`: the initial bracket does not contain the root (the
///   implied-volatility bracketing failure); callers may widen and retry
/// - `Cancelled`: a cooperative cancellation flag was raised mid-solve
///
/// # Examples
/// ```
/// use amopt_core::types::SolverError;
///
/// let err = SolverError::MaxIterationsExceeded { iterations: 100 };
/// assert!(format!("{}", err).contains("100 iterations"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Failed to converge within the maximum number of iterations.
    #[error("failed to converge after {iterations} iterations")]
    MaxIterationsExceeded {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// No valid bracket: function values at the endpoints have the same sign.
    #[error("no bracket: f({a}) and f({b}) have the same sign")]
    NoBracket {
        /// Left bracket endpoint.
        a: f64,
        /// Right bracket endpoint.
        b: f64,
    },

    /// The solve was cancelled via the cooperative cancellation flag.
    #[error("solve cancelled after {iterations} iterations")]
    Cancelled {
        /// Number of iterations completed before cancellation.
        iterations: usize,
    },
}
