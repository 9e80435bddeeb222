//! Exercise-boundary representations.
//!
//! `ExerciseBoundary` is a tagged union over the two exercise regimes:
//! one frontier for the standard American option, or an exercise band
//! with a lower and an upper frontier under negative rates. The pricing
//! engine dispatches on the variant by pattern matching.
//!
//! Both variants serialise with serde so a caller-owned cache can persist
//! converged boundaries keyed by its own (symbol, strike, expiry) scheme;
//! the solver itself never caches.

use amopt_core::types::PricingError;
use serde::{Deserialize, Serialize};

/// An exercise frontier sampled at ascending time-to-expiry collocation
/// points, interpolated linearly in `sqrt(tau)` between samples.
///
/// A collocation value of `0.0` marks the degenerate no-early-exercise
/// case (the exercise region is empty at that time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCurve {
    taus: Vec<f64>,
    values: Vec<f64>,
}

impl BoundaryCurve {
    /// Creates a curve from matching `taus` / `values` samples.
    ///
    /// # Errors
    /// `PricingError::InvalidInput` if the slices differ in length, are
    /// shorter than two points, the taus are not strictly ascending from
    /// zero, or any value is negative or non-finite.
    pub fn new(taus: Vec<f64>, values: Vec<f64>) -> Result<Self, PricingError> {
        if taus.len() != values.len() {
            return Err(PricingError::InvalidInput(format!(
                "boundary needs matching samples, got {} taus and {} values",
                taus.len(),
                values.len()
            )));
        }
        if taus.len() < 2 {
            return Err(PricingError::InvalidInput(
                "boundary needs at least two collocation points".to_string(),
            ));
        }
        if taus[0] != 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "boundary must start at tau = 0, got {}",
                taus[0]
            )));
        }
        for w in taus.windows(2) {
            if !(w[1] > w[0]) {
                return Err(PricingError::InvalidInput(
                    "boundary taus must be strictly ascending".to_string(),
                ));
            }
        }
        for &v in &values {
            if !v.is_finite() || v < 0.0 {
                return Err(PricingError::InvalidInput(format!(
                    "boundary values must be finite and non-negative, got {}",
                    v
                )));
            }
        }
        Ok(Self { taus, values })
    }

    /// Collocation times.
    #[inline]
    pub fn taus(&self) -> &[f64] {
        &self.taus
    }

    /// Boundary values at the collocation times.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Terminal (tau = 0) boundary value.
    #[inline]
    pub fn terminal_value(&self) -> f64 {
        self.values[0]
    }

    /// Boundary value at an arbitrary time-to-expiry.
    ///
    /// Interpolates linearly in `sqrt(tau)`, which matches the boundary's
    /// square-root behaviour near expiry; clamps outside the sampled
    /// range.
    pub fn value_at(&self, tau: f64) -> f64 {
        interpolate_sqrt_tau(&self.taus, &self.values, tau)
    }

    /// Maps every value through `scale / value` (the McDonald-Schroder
    /// boundary symmetry); degenerate zero values stay zero.
    pub(crate) fn reciprocal_scaled(&self, scale: f64) -> Self {
        let values = self
            .values
            .iter()
            .map(|&v| if v > 0.0 { scale / v } else { 0.0 })
            .collect();
        Self {
            taus: self.taus.clone(),
            values,
        }
    }
}

/// Boundary interpolation over raw slices, shared with the solver's
/// working buffers so the iteration allocates nothing.
pub(crate) fn interpolate_sqrt_tau(taus: &[f64], values: &[f64], tau: f64) -> f64 {
    let n = taus.len();
    if tau <= taus[0] {
        return values[0];
    }
    if tau >= taus[n - 1] {
        return values[n - 1];
    }
    // partition_point returns the first index with taus[idx] > tau.
    let hi = taus.partition_point(|&t| t <= tau);
    let lo = hi - 1;
    let s = tau.sqrt();
    let s_lo = taus[lo].sqrt();
    let s_hi = taus[hi].sqrt();
    let w = (s - s_lo) / (s_hi - s_lo);
    values[lo] + w * (values[hi] - values[lo])
}

/// Early-exercise boundary of an American option.
///
/// `Single` is the standard one-sided frontier; `Double` is the exercise
/// band (both a lower and an upper frontier) that emerges under negative
/// rates. Within `Double`, `lower <= upper` holds at every collocation
/// point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExerciseBoundary {
    /// One exercise frontier.
    Single(BoundaryCurve),
    /// Exercise band with lower and upper frontiers.
    Double {
        /// Lower frontier of the exercise band.
        lower: BoundaryCurve,
        /// Upper frontier of the exercise band.
        upper: BoundaryCurve,
    },
}

impl ExerciseBoundary {
    /// Builds a double boundary, validating the band ordering.
    ///
    /// # Errors
    /// `PricingError::InvalidInput` if the curves sample different times
    /// or `lower > upper` anywhere.
    pub fn double(lower: BoundaryCurve, upper: BoundaryCurve) -> Result<Self, PricingError> {
        if lower.taus() != upper.taus() {
            return Err(PricingError::InvalidInput(
                "band frontiers must share collocation times".to_string(),
            ));
        }
        for (i, (&lo, &hi)) in lower.values().iter().zip(upper.values()).enumerate() {
            if lo > hi {
                return Err(PricingError::InvalidInput(format!(
                    "band ordering violated at collocation point {}: lower {} > upper {}",
                    i, lo, hi
                )));
            }
        }
        Ok(Self::Double { lower, upper })
    }

    /// `true` for the double-boundary (band) variant.
    #[inline]
    pub fn is_double(&self) -> bool {
        matches!(self, Self::Double { .. })
    }

    /// The upper frontier (the only frontier for `Single`).
    pub fn upper(&self) -> &BoundaryCurve {
        match self {
            Self::Single(curve) => curve,
            Self::Double { upper, .. } => upper,
        }
    }

    /// The lower frontier, if the boundary is a band.
    pub fn lower(&self) -> Option<&BoundaryCurve> {
        match self {
            Self::Single(_) => None,
            Self::Double { lower, .. } => Some(lower),
        }
    }

    /// Maps a put-coordinate boundary into call coordinates (or back).
    ///
    /// Uses `B_call(tau) = strike * spot / B_put(tau)`; the reciprocal
    /// swaps the band frontiers.
    pub(crate) fn symmetric_map(&self, strike_times_spot: f64) -> Self {
        match self {
            Self::Single(curve) => Self::Single(curve.reciprocal_scaled(strike_times_spot)),
            Self::Double { lower, upper } => Self::Double {
                lower: upper.reciprocal_scaled(strike_times_spot),
                upper: lower.reciprocal_scaled(strike_times_spot),
            },
        }
    }
}
