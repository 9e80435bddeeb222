//! Calendar-spread pricing.
//!
//! A calendar spread is two legs at the same strike with different
//! expiries; each leg prices independently through the boundary engine
//! and the net Greeks follow the long-calendar convention (long back
//! leg, short front leg).

use amopt_core::types::{CalendarSpreadParameters, PricingError, SpreadPricing};

use crate::engine::BoundaryEngine;

impl BoundaryEngine {
    /// Prices a calendar spread: both legs plus net values.
    ///
    /// `back_maturity > front_maturity` is enforced by the parameter
    /// constructor and re-checked here for callers that build the struct
    /// directly.
    ///
    /// # Errors
    /// `PricingError::InvalidInput` on leg or ordering violations; leg
    /// pricing failures propagate fail-loud.
    pub fn price_calendar_spread(
        &self,
        params: &CalendarSpreadParameters,
    ) -> Result<SpreadPricing, PricingError> {
        if params.back_maturity <= params.front_maturity {
            return Err(PricingError::InvalidInput(format!(
                "back expiry ({}) must exceed front expiry ({})",
                params.back_maturity, params.front_maturity
            )));
        }
        let front = self.price_option(&params.front_leg()?)?;
        let back = self.price_option(&params.back_leg()?)?;
        Ok(SpreadPricing::from_legs(front, back))
    }
}
