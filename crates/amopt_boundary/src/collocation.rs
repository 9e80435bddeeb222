//! Collocation grids in time-to-expiry.
//!
//! The boundary is represented at discrete time-to-expiry points. The
//! grid is quadratically clustered towards expiry, where the boundary has
//! square-root behaviour and needs the most resolution.

use amopt_core::types::PricingError;

/// Ascending time-to-expiry collocation points; the first point is always
/// `0.0` (expiry) and the last is the option maturity.
#[derive(Debug, Clone, PartialEq)]
pub struct CollocationGrid {
    taus: Vec<f64>,
}

impl CollocationGrid {
    /// Minimum number of collocation points.
    pub const MIN_POINTS: usize = 4;

    /// Builds a grid of `points` values `tau_i = maturity * (i/(n-1))²`.
    ///
    /// # Errors
    /// `PricingError::InvalidInput` if `maturity <= 0`, maturity is
    /// non-finite, or `points < MIN_POINTS`.
    pub fn new(maturity: f64, points: usize) -> Result<Self, PricingError> {
        if !maturity.is_finite() || maturity <= 0.0 {
            return Err(PricingError::InvalidInput(format!(
                "maturity must be positive and finite, got {}",
                maturity
            )));
        }
        if points < Self::MIN_POINTS {
            return Err(PricingError::InvalidInput(format!(
                "need at least {} collocation points, got {}",
                Self::MIN_POINTS,
                points
            )));
        }
        let n = points - 1;
        let taus = (0..points)
            .map(|i| {
                let x = i as f64 / n as f64;
                maturity * x * x
            })
            .collect();
        Ok(Self { taus })
    }

    /// The collocation times, ascending from `0.0` to maturity.
    #[inline]
    pub fn taus(&self) -> &[f64] {
        &self.taus
    }

    /// Number of collocation points.
    #[inline]
    pub fn len(&self) -> usize {
        self.taus.len()
    }

    /// Always `false`: construction guarantees at least `MIN_POINTS`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.taus.is_empty()
    }

    /// The option maturity (last collocation time).
    #[inline]
    pub fn maturity(&self) -> f64 {
        self.taus[self.taus.len() - 1]
    }
}
