//! Black-Scholes-Merton model for European options with a continuous
//! dividend yield.
//!
//! This is the analytical backbone shared by the implied-volatility
//! solver, the QD+ boundary approximation and the European leg of the
//! Kim-integral solver.
//!
//! ## Mathematical Formulas
//!
//! **Call**: C = S·e^(-qT)·N(d₁) - K·e^(-rT)·N(d₂)
//! **Put**:  P = K·e^(-rT)·N(-d₂) - S·e^(-qT)·N(-d₁)
//!
//! Where:
//! - d₁ = (ln(S/K) + (r - q + σ²/2)T) / (σ√T)
//! - d₂ = d₁ - σ√T

use crate::types::{OptionParameters, OptionType, PricingError};

use super::distributions::{norm_cdf, norm_pdf};

/// Threshold below which expiry or volatility is treated as degenerate.
const EPSILON: f64 = 1e-12;

/// Black-Scholes-Merton model.
///
/// Signed rates and dividend yields are accepted without restriction.
///
/// # Examples
/// ```
/// use amopt_core::math::black_scholes::BlackScholes;
///
/// let bs = BlackScholes::new(100.0, 0.05, 0.02, 0.2).unwrap();
/// let call = bs.price_call(100.0, 1.0);
/// let put = bs.price_put(100.0, 1.0);
///
/// // Put-call parity: C - P = S·e^(-qT) - K·e^(-rT)
/// let forward = 100.0 * (-0.02_f64).exp() - 100.0 * (-0.05_f64).exp();
/// assert!((call - put - forward).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BlackScholes {
    spot: f64,
    rate: f64,
    dividend: f64,
    volatility: f64,
}

impl BlackScholes {
    /// Creates a new model.
    ///
    /// # Errors
    /// `PricingError::InvalidInput` if `spot <= 0` or `volatility < 0`.
    pub fn new(spot: f64, rate: f64, dividend: f64, volatility: f64) -> Result<Self, PricingError> {
        if !(spot > 0.0) {
            return Err(PricingError::InvalidInput(format!(
                "spot must be positive, got {}",
                spot
            )));
        }
        if !(volatility >= 0.0) {
            return Err(PricingError::InvalidInput(format!(
                "volatility must be non-negative, got {}",
                volatility
            )));
        }
        Ok(Self {
            spot,
            rate,
            dividend,
            volatility,
        })
    }

    /// Builds a model from validated option parameters.
    pub fn from_params(params: &OptionParameters) -> Self {
        Self {
            spot: params.spot,
            rate: params.rate,
            dividend: params.dividend,
            volatility: params.volatility,
        }
    }

    /// Spot price.
    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Volatility.
    #[inline]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// The d₁ term. Degenerate expiry/volatility maps to ±large by
    /// forward moneyness.
    #[inline]
    pub fn d1(&self, strike: f64, expiry: f64) -> f64 {
        if expiry <= EPSILON || self.volatility <= EPSILON {
            let forward = self.spot * ((self.rate - self.dividend) * expiry.max(0.0)).exp();
            return if forward > strike {
                1e3
            } else if forward < strike {
                -1e3
            } else {
                0.0
            };
        }
        let vol_sqrt_t = self.volatility * expiry.sqrt();
        let log_moneyness = (self.spot / strike).ln();
        let drift =
            (self.rate - self.dividend + 0.5 * self.volatility * self.volatility) * expiry;
        (log_moneyness + drift) / vol_sqrt_t
    }

    /// The d₂ term: d₁ - σ√T.
    #[inline]
    pub fn d2(&self, strike: f64, expiry: f64) -> f64 {
        if expiry <= EPSILON || self.volatility <= EPSILON {
            return self.d1(strike, expiry);
        }
        self.d1(strike, expiry) - self.volatility * expiry.sqrt()
    }

    /// Price for either payoff direction.
    #[inline]
    pub fn price(&self, option_type: OptionType, strike: f64, expiry: f64) -> f64 {
        match option_type {
            OptionType::Call => self.price_call(strike, expiry),
            OptionType::Put => self.price_put(strike, expiry),
        }
    }

    /// European call price.
    #[inline]
    pub fn price_call(&self, strike: f64, expiry: f64) -> f64 {
        if expiry <= EPSILON {
            return (self.spot - strike).max(0.0);
        }
        if self.volatility <= EPSILON {
            let forward_gap = self.spot * (-self.dividend * expiry).exp()
                - strike * (-self.rate * expiry).exp();
            return forward_gap.max(0.0);
        }
        let d1 = self.d1(strike, expiry);
        let d2 = self.d2(strike, expiry);
        self.spot * (-self.dividend * expiry).exp() * norm_cdf(d1)
            - strike * (-self.rate * expiry).exp() * norm_cdf(d2)
    }

    /// European put price.
    #[inline]
    pub fn price_put(&self, strike: f64, expiry: f64) -> f64 {
        if expiry <= EPSILON {
            return (strike - self.spot).max(0.0);
        }
        if self.volatility <= EPSILON {
            let forward_gap = strike * (-self.rate * expiry).exp()
                - self.spot * (-self.dividend * expiry).exp();
            return forward_gap.max(0.0);
        }
        let d1 = self.d1(strike, expiry);
        let d2 = self.d2(strike, expiry);
        strike * (-self.rate * expiry).exp() * norm_cdf(-d2)
            - self.spot * (-self.dividend * expiry).exp() * norm_cdf(-d1)
    }

    /// Delta: e^(-qT)·N(d₁) for calls, e^(-qT)·(N(d₁) - 1) for puts.
    #[inline]
    pub fn delta(&self, option_type: OptionType, strike: f64, expiry: f64) -> f64 {
        if expiry <= EPSILON {
            return match option_type {
                OptionType::Call if self.spot > strike => 1.0,
                OptionType::Put if self.spot < strike => -1.0,
                _ => 0.0,
            };
        }
        let dq = (-self.dividend * expiry).exp();
        let n_d1 = norm_cdf(self.d1(strike, expiry));
        match option_type {
            OptionType::Call => dq * n_d1,
            OptionType::Put => dq * (n_d1 - 1.0),
        }
    }

    /// Gamma: e^(-qT)·φ(d₁) / (S·σ·√T), identical for calls and puts.
    #[inline]
    pub fn gamma(&self, strike: f64, expiry: f64) -> f64 {
        if expiry <= EPSILON || self.volatility <= EPSILON {
            return 0.0;
        }
        let dq = (-self.dividend * expiry).exp();
        dq * norm_pdf(self.d1(strike, expiry)) / (self.spot * self.volatility * expiry.sqrt())
    }

    /// Vega: S·e^(-qT)·√T·φ(d₁), identical for calls and puts.
    #[inline]
    pub fn vega(&self, strike: f64, expiry: f64) -> f64 {
        if expiry <= EPSILON {
            return 0.0;
        }
        let dq = (-self.dividend * expiry).exp();
        self.spot * dq * expiry.sqrt() * norm_pdf(self.d1(strike, expiry))
    }

    /// Theta (calendar-time decay, per year).
    #[inline]
    pub fn theta(&self, option_type: OptionType, strike: f64, expiry: f64) -> f64 {
        if expiry <= EPSILON {
            return 0.0;
        }
        let d1 = self.d1(strike, expiry);
        let d2 = self.d2(strike, expiry);
        let dq = (-self.dividend * expiry).exp();
        let dr = (-self.rate * expiry).exp();
        let decay = -self.spot * dq * self.volatility * norm_pdf(d1) / (2.0 * expiry.sqrt());
        match option_type {
            OptionType::Call => {
                decay + self.dividend * self.spot * dq * norm_cdf(d1)
                    - self.rate * strike * dr * norm_cdf(d2)
            }
            OptionType::Put => {
                decay - self.dividend * self.spot * dq * norm_cdf(-d1)
                    + self.rate * strike * dr * norm_cdf(-d2)
            }
        }
    }

    /// Rho: K·T·e^(-rT)·N(d₂) for calls, -K·T·e^(-rT)·N(-d₂) for puts.
    #[inline]
    pub fn rho(&self, option_type: OptionType, strike: f64, expiry: f64) -> f64 {
        if expiry <= EPSILON {
            return 0.0;
        }
        let dr = (-self.rate * expiry).exp();
        let d2 = self.d2(strike, expiry);
        match option_type {
            OptionType::Call => strike * expiry * dr * norm_cdf(d2),
            OptionType::Put => -strike * expiry * dr * norm_cdf(-d2),
        }
    }
}
