//! Heston (1993) semi-analytical pricer.
//!
//! European options under the Heston stochastic-volatility model
//!
//! ```text
//! dS = (r - q)·S·dt + sqrt(v)·S·dW₁
//! dv = kappa·(theta - v)·dt + sigma_v·sqrt(v)·dW₂,   dW₁·dW₂ = rho·dt
//! ```
//!
//! priced via the probability integrals
//!
//! ```text
//! C = S·e^(-qT)·P₁ - K·e^(-rT)·P₂
//! P_j = 1/2 + (1/π)·∫₀^∞ Re[ e^(-iφ·lnK)·f_j(φ) / (iφ) ] dφ
//! ```
//!
//! computed with the shared adaptive quadrature core over `[1e-8, ∞)`;
//! the lower-bound offset stands in for the integrable `1/φ` singularity
//! at zero. Puts price through put-call parity.
//!
//! ## Branch-cut correction
//!
//! The complex square root `d` must stay on the analytic branch as `φ`
//! sweeps the integration ray: the sign of `d` is flipped whenever
//! `Re(d) < 0`. Combined with the `g = (b - ρσiφ - d)/(b - ρσiφ + d)`
//! formulation and the decaying exponent `e^(-dT)`, this keeps the
//! characteristic function continuous for long maturities. This is a
//! correctness requirement, not a style choice.

use num_complex::Complex64;
use std::f64::consts::PI;
use thiserror::Error;

use amopt_core::math::black_scholes::BlackScholes;
use amopt_core::math::quadrature::{integrate_to_infinity, QuadratureConfig};
use amopt_core::math::solvers::{solve_implied_volatility, SolverConfig};
use amopt_core::types::PricingError;

/// Lower integration bound standing in for the `1/φ` singularity at zero.
const PHI_OFFSET: f64 = 1e-8;

/// Heston model errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HestonError {
    /// Mean-reversion speed must be positive.
    #[error("invalid kappa: {0} (must be positive)")]
    InvalidKappa(f64),

    /// Long-run variance must be positive.
    #[error("invalid theta: {0} (must be positive)")]
    InvalidTheta(f64),

    /// Vol-of-vol must be positive.
    #[error("invalid sigma_v: {0} (must be positive)")]
    InvalidSigmaV(f64),

    /// Correlation must lie in (-1, 1).
    #[error("invalid rho: {0} (must be in (-1, 1))")]
    InvalidRho(f64),

    /// Initial variance must be positive.
    #[error("invalid v0: {0} (must be positive)")]
    InvalidV0(f64),

    /// Invalid pricing inputs (spot, strike or maturity).
    #[error("invalid pricing input: {0}")]
    InvalidInput(String),

    /// The probability integrals failed to produce a usable value.
    #[error("numerical instability: {0}")]
    NumericalInstability(String),
}

impl From<HestonError> for PricingError {
    fn from(err: HestonError) -> Self {
        match err {
            HestonError::NumericalInstability(msg) => PricingError::NumericalInstability(msg),
            other => PricingError::InvalidInput(other.to_string()),
        }
    }
}

/// Calibrated Heston parameters, immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HestonParameters {
    /// Mean-reversion speed of the variance process.
    pub kappa: f64,
    /// Long-run variance.
    pub theta: f64,
    /// Volatility of variance.
    pub sigma_v: f64,
    /// Spot-variance correlation.
    pub rho: f64,
    /// Initial variance.
    pub v0: f64,
    /// Continuously compounded risk-free rate (signed).
    pub rate: f64,
    /// Continuous dividend yield (signed).
    pub dividend: f64,
}

impl HestonParameters {
    /// Creates validated parameters.
    ///
    /// # Errors
    /// The matching [`HestonError`] variant for the first violated
    /// constraint.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kappa: f64,
        theta: f64,
        sigma_v: f64,
        rho: f64,
        v0: f64,
        rate: f64,
        dividend: f64,
    ) -> Result<Self, HestonError> {
        if !(kappa > 0.0) {
            return Err(HestonError::InvalidKappa(kappa));
        }
        if !(theta > 0.0) {
            return Err(HestonError::InvalidTheta(theta));
        }
        if !(sigma_v > 0.0) {
            return Err(HestonError::InvalidSigmaV(sigma_v));
        }
        if !(rho > -1.0 && rho < 1.0) {
            return Err(HestonError::InvalidRho(rho));
        }
        if !(v0 > 0.0) {
            return Err(HestonError::InvalidV0(v0));
        }
        if !rate.is_finite() || !dividend.is_finite() {
            return Err(HestonError::InvalidInput(format!(
                "rate {} and dividend {} must be finite",
                rate, dividend
            )));
        }
        Ok(Self {
            kappa,
            theta,
            sigma_v,
            rho,
            v0,
            rate,
            dividend,
        })
    }

    /// Feller condition: `2·kappa·theta > sigma_v²` keeps the variance
    /// process strictly positive.
    pub fn satisfies_feller(&self) -> bool {
        2.0 * self.kappa * self.theta > self.sigma_v * self.sigma_v
    }

    /// Feller ratio `2·kappa·theta / sigma_v²` (>= 1 satisfies Feller).
    pub fn feller_ratio(&self) -> f64 {
        2.0 * self.kappa * self.theta / (self.sigma_v * self.sigma_v)
    }
}

/// Log-characteristic-function exponent `C_j + D_j·v0` for probability
/// `j ∈ {1, 2}`.
fn characteristic_exponent(
    phi: f64,
    maturity: f64,
    params: &HestonParameters,
    j: usize,
) -> Complex64 {
    let i = Complex64::new(0.0, 1.0);
    let sigma = params.sigma_v;
    let sigma2 = sigma * sigma;

    let (u, b) = if j == 1 {
        (0.5, params.kappa - params.rho * sigma)
    } else {
        (-0.5, params.kappa)
    };

    let iphi = i * phi;
    let beta = Complex64::new(b, 0.0) - params.rho * sigma * iphi;
    let mut d = (beta * beta - sigma2 * (2.0 * u * iphi - phi * phi)).sqrt();
    // Keep d on the analytic branch: flip the root if Re(d) < 0.
    if d.re < 0.0 {
        d = -d;
    }

    // Stable "g minus" formulation with the decaying exponent e^(-dT).
    let g = (beta - d) / (beta + d);
    let exp_mdt = (-d * maturity).exp();
    let one = Complex64::new(1.0, 0.0);

    let log_term = ((one - g * exp_mdt) / (one - g)).ln();
    let c = (params.kappa * params.theta / sigma2) * ((beta - d) * maturity - 2.0 * log_term);
    let d_fn = ((beta - d) / sigma2) * ((one - exp_mdt) / (one - g * exp_mdt));

    c + d_fn * params.v0
}

/// Probability integral `P_j` via the shared quadrature core.
fn probability(
    j: usize,
    spot: f64,
    strike: f64,
    maturity: f64,
    params: &HestonParameters,
) -> f64 {
    // ln(forward moneyness): the drift folds into the exponent here
    // instead of the characteristic function.
    let x = (spot / strike).ln() + (params.rate - params.dividend) * maturity;

    let integrand = |phi: f64| {
        let exponent = characteristic_exponent(phi, maturity, params, j);
        let value = (exponent + Complex64::new(0.0, phi * x)).exp();
        // Re[value / (i·phi)] = Im(value) / phi
        value.im / phi
    };

    let quad = integrate_to_infinity(integrand, PHI_OFFSET, &QuadratureConfig::default());
    let p = 0.5 + quad.value / PI;
    p.clamp(0.0, 1.0)
}

/// Prices a European option under the Heston model.
///
/// # Errors
/// `HestonError::InvalidInput` on non-positive spot/strike/maturity;
/// `HestonError::NumericalInstability` if the probability integrals
/// degenerate.
pub fn heston_price(
    spot: f64,
    strike: f64,
    maturity: f64,
    params: &HestonParameters,
    is_call: bool,
) -> Result<f64, HestonError> {
    if !(spot > 0.0) || !(strike > 0.0) || !(maturity > 0.0) {
        return Err(HestonError::InvalidInput(format!(
            "spot {}, strike {} and maturity {} must be positive",
            spot, strike, maturity
        )));
    }

    let p1 = probability(1, spot, strike, maturity, params);
    let p2 = probability(2, spot, strike, maturity, params);
    if !p1.is_finite() || !p2.is_finite() {
        return Err(HestonError::NumericalInstability(format!(
            "probability integrals degenerated: P1 = {}, P2 = {}",
            p1, p2
        )));
    }

    let df_q = (-params.dividend * maturity).exp();
    let df_r = (-params.rate * maturity).exp();
    let call = (spot * df_q * p1 - strike * df_r * p2).max(0.0);

    let price = if is_call {
        call
    } else {
        // Put-call parity.
        (call - spot * df_q + strike * df_r).max(0.0)
    };
    Ok(price)
}

/// Black-Scholes implied volatility of a Heston price, via the shared
/// Brent solver.
///
/// # Errors
/// Heston input errors (converted), or the solver's bracketing /
/// non-convergence failures.
pub fn heston_implied_vol(
    spot: f64,
    strike: f64,
    maturity: f64,
    params: &HestonParameters,
    is_call: bool,
) -> Result<f64, PricingError> {
    let target = heston_price(spot, strike, maturity, params, is_call)?;
    let rate = params.rate;
    let dividend = params.dividend;
    let bs_price = |vol: f64| {
        BlackScholes::new(spot, rate, dividend, vol)
            .map(|bs| {
                if is_call {
                    bs.price_call(strike, maturity)
                } else {
                    bs.price_put(strike, maturity)
                }
            })
            .unwrap_or(f64::NAN)
    };
    solve_implied_volatility(bs_price, target, 1e-4, 5.0, &SolverConfig::default())
        .map_err(Into::into)
}
