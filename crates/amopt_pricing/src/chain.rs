//! Parallel pricing of an option chain.
//!
//! The solver and engine carry no shared mutable state, so chain pricing
//! is plain data parallelism at the caller level: one rayon task per
//! option, each owning its solve buffers. Nothing below this layer
//! spawns or shares threads.

use amopt_core::types::{OptionParameters, OptionPricing, PricingError};
use rayon::prelude::*;

use crate::engine::BoundaryEngine;

impl BoundaryEngine {
    /// Prices every option of a chain in parallel.
    ///
    /// Results are positionally aligned with the input; each option
    /// succeeds or fails independently (one bad strike does not poison
    /// the chain).
    pub fn price_chain(
        &self,
        chain: &[OptionParameters],
    ) -> Vec<Result<OptionPricing, PricingError>> {
        chain
            .par_iter()
            .map(|params| self.price_option(params))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use amopt_core::types::{OptionParameters, OptionType};

    use crate::engine::BoundaryEngine;

    #[test]
    fn chain_matches_sequential_pricing() {
        let engine = BoundaryEngine::with_defaults();
        let chain: Vec<_> = [80.0, 90.0, 100.0, 110.0, 120.0]
            .iter()
            .map(|&strike| {
                OptionParameters::new(100.0, strike, 0.5, 0.05, 0.02, 0.3, OptionType::Put)
                    .unwrap()
            })
            .collect();

        let parallel = engine.price_chain(&chain);
        assert_eq!(parallel.len(), chain.len());
        for (params, result) in chain.iter().zip(&parallel) {
            let sequential = engine.price_option(params).unwrap();
            let parallel_pricing = result.as_ref().unwrap();
            assert!((sequential.price - parallel_pricing.price).abs() < 1e-12);
        }
    }

    #[test]
    fn one_bad_option_does_not_poison_the_chain() {
        let engine = BoundaryEngine::with_defaults();
        let good =
            OptionParameters::new(100.0, 100.0, 0.5, 0.05, 0.02, 0.3, OptionType::Put).unwrap();
        let mut bad = good;
        bad.strike = -1.0;

        let results = engine.price_chain(&[good, bad, good]);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
    }
}
