//! Option and calendar-spread parameter types.
//!
//! `OptionParameters` is the single input record for every pricing call.
//! It is validated once at construction and then passed around by
//! reference; the bump helpers (`with_spot`, `with_volatility`, ...) are
//! used by the Greeks engine to produce shifted copies without repeating
//! validation logic at each call site.

use serde::{Deserialize, Serialize};

use super::error::PricingError;

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    /// Right to buy at the strike.
    Call,
    /// Right to sell at the strike.
    Put,
}

impl OptionType {
    /// Payoff sign: `+1.0` for calls, `-1.0` for puts.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// Returns `true` for a call.
    #[inline]
    pub fn is_call(self) -> bool {
        matches!(self, OptionType::Call)
    }
}

/// Immutable per-request pricing inputs.
///
/// Rates and dividend yields are signed: negative values are first-class
/// inputs, not errors, and drive the double-boundary exercise regime.
///
/// # Invariants
/// - `spot > 0`, `strike > 0`, `maturity > 0`
/// - `volatility >= 0`
/// - all fields finite
///
/// # Examples
/// ```
/// use amopt_core::types::{OptionParameters, OptionType};
///
/// let params = OptionParameters::new(
///     100.0, 95.0, 0.5, -0.01, -0.03, 0.25, OptionType::Put,
/// ).unwrap();
/// assert!(params.rate < 0.0);
///
/// // Non-positive spot is rejected up front.
/// assert!(OptionParameters::new(0.0, 95.0, 0.5, 0.01, 0.0, 0.25, OptionType::Put).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionParameters {
    /// Spot price of the underlying.
    pub spot: f64,
    /// Strike price.
    pub strike: f64,
    /// Time to expiry in years.
    pub maturity: f64,
    /// Continuously compounded risk-free rate (signed).
    pub rate: f64,
    /// Continuous dividend yield (signed).
    pub dividend: f64,
    /// Implied volatility.
    pub volatility: f64,
    /// Call or put.
    pub option_type: OptionType,
}

impl OptionParameters {
    /// Creates validated option parameters.
    ///
    /// # Errors
    /// `PricingError::InvalidInput` if spot, strike or maturity is not
    /// strictly positive, if volatility is negative, or if any field is
    /// non-finite.
    pub fn new(
        spot: f64,
        strike: f64,
        maturity: f64,
        rate: f64,
        dividend: f64,
        volatility: f64,
        option_type: OptionType,
    ) -> Result<Self, PricingError> {
        let params = Self {
            spot,
            strike,
            maturity,
            rate,
            dividend,
            volatility,
            option_type,
        };
        params.validate()?;
        Ok(params)
    }

    /// Re-checks the construction invariants.
    pub fn validate(&self) -> Result<(), PricingError> {
        for (name, value) in [
            ("spot", self.spot),
            ("strike", self.strike),
            ("maturity", self.maturity),
            ("rate", self.rate),
            ("dividend", self.dividend),
            ("volatility", self.volatility),
        ] {
            if !value.is_finite() {
                return Err(PricingError::InvalidInput(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }
        if self.spot <= 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "spot must be positive, got {}",
                self.spot
            )));
        }
        if self.strike <= 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "strike must be positive, got {}",
                self.strike
            )));
        }
        if self.maturity <= 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "maturity must be positive, got {}",
                self.maturity
            )));
        }
        if self.volatility < 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "volatility must be non-negative, got {}",
                self.volatility
            )));
        }
        Ok(())
    }

    /// Returns a copy with the spot replaced (re-validated).
    pub fn with_spot(mut self, spot: f64) -> Result<Self, PricingError> {
        self.spot = spot;
        self.validate()?;
        Ok(self)
    }

    /// Returns a copy with the volatility replaced (re-validated).
    pub fn with_volatility(mut self, volatility: f64) -> Result<Self, PricingError> {
        self.volatility = volatility;
        self.validate()?;
        Ok(self)
    }

    /// Returns a copy with the maturity replaced (re-validated).
    pub fn with_maturity(mut self, maturity: f64) -> Result<Self, PricingError> {
        self.maturity = maturity;
        self.validate()?;
        Ok(self)
    }

    /// Returns a copy with the risk-free rate replaced (re-validated).
    pub fn with_rate(mut self, rate: f64) -> Result<Self, PricingError> {
        self.rate = rate;
        self.validate()?;
        Ok(self)
    }

    /// Put-call symmetry dual: `C(S, K, r, q) = P(K, S, q, r)`.
    ///
    /// Maps a call into the put whose American value is identical
    /// (McDonald-Schroder symmetry), and vice versa. The engine uses this
    /// to solve every exercise boundary in put coordinates.
    pub fn symmetric_dual(&self) -> Self {
        Self {
            spot: self.strike,
            strike: self.spot,
            rate: self.dividend,
            dividend: self.rate,
            option_type: match self.option_type {
                OptionType::Call => OptionType::Put,
                OptionType::Put => OptionType::Call,
            },
            ..*self
        }
    }

    /// Intrinsic value at the current spot.
    #[inline]
    pub fn intrinsic(&self) -> f64 {
        (self.option_type.sign() * (self.spot - self.strike)).max(0.0)
    }
}

/// Inputs for a calendar spread: two legs at the same strike with
/// different expiries.
///
/// The conventional long calendar is short the front leg and long the
/// back leg; `SpreadPricing` reports net values under that convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalendarSpreadParameters {
    /// Spot price of the underlying.
    pub spot: f64,
    /// Shared strike price.
    pub strike: f64,
    /// Time to the front expiry in years.
    pub front_maturity: f64,
    /// Time to the back expiry in years; must exceed `front_maturity`.
    pub back_maturity: f64,
    /// Continuously compounded risk-free rate (signed).
    pub rate: f64,
    /// Continuous dividend yield (signed).
    pub dividend: f64,
    /// Implied volatility of the front leg.
    pub front_volatility: f64,
    /// Implied volatility of the back leg.
    pub back_volatility: f64,
    /// Call or put (both legs).
    pub option_type: OptionType,
}

impl CalendarSpreadParameters {
    /// Creates validated spread parameters.
    ///
    /// # Errors
    /// `PricingError::InvalidInput` if either leg fails option-parameter
    /// validation or if `back_maturity <= front_maturity`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spot: f64,
        strike: f64,
        front_maturity: f64,
        back_maturity: f64,
        rate: f64,
        dividend: f64,
        front_volatility: f64,
        back_volatility: f64,
        option_type: OptionType,
    ) -> Result<Self, PricingError> {
        let params = Self {
            spot,
            strike,
            front_maturity,
            back_maturity,
            rate,
            dividend,
            front_volatility,
            back_volatility,
            option_type,
        };
        if back_maturity <= front_maturity {
            return Err(PricingError::InvalidInput(format!(
                "back expiry ({}) must exceed front expiry ({})",
                back_maturity, front_maturity
            )));
        }
        params.front_leg()?;
        params.back_leg()?;
        Ok(params)
    }

    /// The front-expiry leg as standalone option parameters.
    pub fn front_leg(&self) -> Result<OptionParameters, PricingError> {
        OptionParameters::new(
            self.spot,
            self.strike,
            self.front_maturity,
            self.rate,
            self.dividend,
            self.front_volatility,
            self.option_type,
        )
    }

    /// The back-expiry leg as standalone option parameters.
    pub fn back_leg(&self) -> Result<OptionParameters, PricingError> {
        OptionParameters::new(
            self.spot,
            self.strike,
            self.back_maturity,
            self.rate,
            self.dividend,
            self.back_volatility,
            self.option_type,
        )
    }
}

/// Price and sensitivities of a single option, immutable once produced.
///
/// A Greek that could not be computed is reported as `0.0` (the engine's
/// documented fail-soft policy); the price itself is always the product of
/// a successful solve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OptionPricing {
    /// Fair value.
    pub price: f64,
    /// dV/dS.
    pub delta: f64,
    /// d²V/dS².
    pub gamma: f64,
    /// dV/dσ.
    pub vega: f64,
    /// dV/dt (calendar-time decay, usually negative).
    pub theta: f64,
    /// dV/dr.
    pub rho: f64,
}

/// Pricing of a calendar spread: both legs plus net values for the
/// conventional long calendar (long back leg, short front leg).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadPricing {
    /// Front-leg pricing.
    pub front: OptionPricing,
    /// Back-leg pricing.
    pub back: OptionPricing,
    /// Net premium: `back.price - front.price`.
    pub price: f64,
    /// Net delta.
    pub delta: f64,
    /// Net gamma.
    pub gamma: f64,
    /// Net vega.
    pub vega: f64,
    /// Net theta.
    pub theta: f64,
    /// Net rho.
    pub rho: f64,
}

impl SpreadPricing {
    /// Aggregates two leg pricings into net spread values.
    pub fn from_legs(front: OptionPricing, back: OptionPricing) -> Self {
        Self {
            front,
            back,
            price: back.price - front.price,
            delta: back.delta - front.delta,
            gamma: back.gamma - front.gamma,
            vega: back.vega - front.vega,
            theta: back.theta - front.theta,
            rho: back.rho - front.rho,
        }
    }
}
