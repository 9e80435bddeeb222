//! End-to-end pricing properties across the engine layers.

use amopt_core::math::black_scholes::BlackScholes;
use amopt_core::types::{OptionParameters, OptionType};
use amopt_pricing::BoundaryEngine;

fn option(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    maturity: f64,
    rate: f64,
    dividend: f64,
    vol: f64,
) -> OptionParameters {
    OptionParameters::new(spot, strike, maturity, rate, dividend, vol, option_type).unwrap()
}

#[test]
fn american_dominates_european_across_strikes() {
    let engine = BoundaryEngine::with_defaults();
    for &strike in &[85.0, 95.0, 100.0, 105.0, 115.0] {
        for &option_type in &[OptionType::Call, OptionType::Put] {
            let params = option(option_type, 100.0, strike, 0.5, 0.05, 0.02, 0.3);
            let american = engine.price(&params).unwrap();
            let european =
                BlackScholes::from_params(&params).price(option_type, strike, 0.5);
            assert!(
                american >= european - 1e-7,
                "{:?} K={}: american {} < european {}",
                option_type,
                strike,
                american,
                european
            );
            assert!(american >= params.intrinsic() - 1e-9);
        }
    }
}

#[test]
fn put_value_decreases_in_spot() {
    let engine = BoundaryEngine::with_defaults();
    let mut last = f64::INFINITY;
    for &spot in &[70.0, 85.0, 100.0, 115.0, 130.0] {
        let price = engine
            .price(&option(OptionType::Put, spot, 100.0, 0.5, 0.05, 0.0, 0.25))
            .unwrap();
        assert!(price < last, "put price not decreasing at spot {}", spot);
        last = price;
    }
}

#[test]
fn greek_bump_workflow_reuses_one_boundary() {
    // The pricing-bridge pattern: one solve, many bumped pricings.
    let engine = BoundaryEngine::with_defaults();
    let base = option(OptionType::Put, 100.0, 100.0, 0.5, 0.05, 0.02, 0.3);
    let solution = engine.solve_boundary(&base).unwrap();

    let mut prices = Vec::new();
    for bump in [-2.0, -1.0, 0.0, 1.0, 2.0] {
        let bumped = base.with_spot(100.0 + bump).unwrap();
        prices.push(engine.price_with_boundary(&bumped, &solution.boundary).unwrap());
    }
    // Monotone in spot for a put, and convex to the eye of a central
    // second difference.
    for w in prices.windows(2) {
        assert!(w[1] < w[0]);
    }
    let second_diff = prices[0] - 2.0 * prices[2] + prices[4];
    assert!(second_diff >= 0.0);
}

#[test]
fn negative_rate_pricing_end_to_end() {
    let engine = BoundaryEngine::with_defaults();
    // Band regime (q < r < 0).
    let band_put = option(OptionType::Put, 50.0, 100.0, 0.5, -0.01, -0.05, 0.2);
    let pricing = engine.price_option(&band_put).unwrap();
    assert!(pricing.price >= band_put.intrinsic() - 1e-9);
    assert!((-1.0..=0.0).contains(&pricing.delta));

    // No-exercise regime (r < 0, q >= 0) prices European.
    let euro_put = option(OptionType::Put, 100.0, 100.0, 0.5, -0.02, 0.01, 0.25);
    let american = engine.price(&euro_put).unwrap();
    let european = BlackScholes::from_params(&euro_put).price_put(100.0, 0.5);
    assert!((american - european).abs() < 1e-9);
}

#[test]
fn implied_vol_round_trip_through_the_american_pricer() {
    let engine = BoundaryEngine::with_defaults();
    let quoted = option(OptionType::Call, 100.0, 105.0, 0.35, 0.04, 0.015, 0.28);
    let market = engine.price(&quoted).unwrap();
    let recovered = engine.implied_volatility(market, &quoted).unwrap();
    assert!((recovered - 0.28).abs() < 1e-6, "vol {}", recovered);
}
