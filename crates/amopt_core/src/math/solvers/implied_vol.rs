//! Implied-volatility root finding.
//!
//! Maps a target market price back to the volatility that reproduces it
//! under a caller-supplied pricing function. The pricing function is
//! opaque: the same solver serves Black-Scholes, the American boundary
//! engine and the Heston cross-check pricer.

use crate::types::SolverError;

use super::{BrentSolver, SolverConfig};

/// Solves `price_fn(vol) == target_price` for `vol` inside
/// `[lower_vol, upper_vol]` with Brent's method.
///
/// The pricing function must be monotone in volatility over the bracket
/// (true for vanilla options via vega > 0).
///
/// # Errors
/// - `SolverError::NoBracket` if `price_fn(lower_vol)` and
///   `price_fn(upper_vol)` do not straddle the target; the caller may
///   widen the bracket and retry
/// - `SolverError::MaxIterationsExceeded` if the budget runs out; no
///   stale or default volatility is ever returned
///
/// # Examples
/// ```
/// use amopt_core::math::black_scholes::BlackScholes;
/// use amopt_core::math::solvers::{solve_implied_volatility, SolverConfig};
///
/// let target = BlackScholes::new(100.0, 0.05, 0.0, 0.25)
///     .unwrap()
///     .price_call(100.0, 1.0);
/// let vol = solve_implied_volatility(
///     |v| BlackScholes::new(100.0, 0.05, 0.0, v).unwrap().price_call(100.0, 1.0),
///     target,
///     1e-4,
///     3.0,
///     &SolverConfig::default(),
/// )
/// .unwrap();
/// assert!((vol - 0.25).abs() < 1e-8);
/// ```
pub fn solve_implied_volatility<F>(
    price_fn: F,
    target_price: f64,
    lower_vol: f64,
    upper_vol: f64,
    config: &SolverConfig,
) -> Result<f64, SolverError>
where
    F: Fn(f64) -> f64,
{
    if !target_price.is_finite() {
        return Err(SolverError::NoBracket {
            a: lower_vol,
            b: upper_vol,
        });
    }
    let objective = |vol: f64| price_fn(vol) - target_price;
    BrentSolver::new(*config).find_root(objective, lower_vol, upper_vol)
}
