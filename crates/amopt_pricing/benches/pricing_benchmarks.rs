//! Pricing hot-path benchmarks: one full pricing with Greeks is five-plus
//! boundary evaluations, and a backtest issues one per simulated day.

use amopt_core::types::{OptionParameters, OptionType};
use amopt_pricing::BoundaryEngine;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_price_with_greeks(c: &mut Criterion) {
    let engine = BoundaryEngine::with_defaults();
    let params =
        OptionParameters::new(100.0, 100.0, 0.25, 0.05, 0.02, 0.30, OptionType::Call).unwrap();
    c.bench_function("price_option_with_greeks", |b| {
        b.iter(|| engine.price_option(black_box(&params)).unwrap())
    });
}

fn bench_cached_boundary_repricing(c: &mut Criterion) {
    let engine = BoundaryEngine::with_defaults();
    let params =
        OptionParameters::new(100.0, 100.0, 0.25, 0.05, 0.02, 0.30, OptionType::Put).unwrap();
    let solution = engine.solve_boundary(&params).unwrap();
    c.bench_function("price_with_cached_boundary", |b| {
        b.iter(|| {
            engine
                .price_with_boundary(black_box(&params), black_box(&solution.boundary))
                .unwrap()
        })
    });
}

fn bench_chain_pricing(c: &mut Criterion) {
    let engine = BoundaryEngine::with_defaults();
    let chain: Vec<_> = (0..16)
        .map(|i| {
            let strike = 80.0 + 2.5 * i as f64;
            OptionParameters::new(100.0, strike, 0.25, 0.05, 0.02, 0.3, OptionType::Put).unwrap()
        })
        .collect();
    c.bench_function("price_chain_16_strikes", |b| {
        b.iter(|| engine.price_chain(black_box(&chain)))
    });
}

criterion_group!(
    benches,
    bench_price_with_greeks,
    bench_cached_boundary_repricing,
    bench_chain_pricing
);
criterion_main!(benches);
