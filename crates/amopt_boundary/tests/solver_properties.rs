//! Cross-module properties of the boundary solver.

use amopt_boundary::{ExerciseRegime, KimSolver, QdPlus};
use amopt_core::types::{OptionParameters, OptionType};

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
fn call_boundary_monotone_in_time_to_expiry() {
    // American call under positive dividend yield: the frontier is
    // non-decreasing in time-to-expiry.
    let params = option(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.03, 0.25);
    let solution = KimSolver::with_defaults().solve(&params).unwrap();
    assert!(solution.status.is_converged());
    let values = solution.boundary.upper().values();
    for w in values.windows(2) {
        assert!(
            w[1] >= w[0] - 1e-6,
            "call frontier decreased with tau: {:?}",
            values
        );
    }
}

#[test]
fn regime_dispatch_single_vs_double() {
    let solver = KimSolver::with_defaults();

    // Standard positive-rate put: single frontier.
    let standard = option(OptionType::Put, 100.0, 100.0, 0.5, 0.04, 0.01, 0.2);
    let solution = solver.solve(&standard).unwrap();
    assert_eq!(solution.regime, ExerciseRegime::Single);
    assert!(!solution.boundary.is_double());

    // Deeply negative short rate with a more negative carry: band.
    let band = option(OptionType::Put, 60.0, 100.0, 0.5, -0.02, -0.08, 0.2);
    let solution = solver.solve(&band).unwrap();
    assert_eq!(solution.regime, ExerciseRegime::Double);
    assert!(solution.boundary.is_double());
    let lower = solution.boundary.lower().unwrap();
    for (lo, hi) in lower.values().iter().zip(solution.boundary.upper().values()) {
        assert!(lo <= hi);
    }
}

#[test]
fn solved_boundary_survives_serde_round_trip() {
    // The engine's own boundary-cache serialisation responsibility.
    let params = option(OptionType::Put, 100.0, 100.0, 0.5, 0.05, 0.02, 0.25);
    let solution = KimSolver::with_defaults().solve(&params).unwrap();
    let json = serde_json::to_string(&solution.boundary).unwrap();
    let restored = serde_json::from_str(&json).unwrap();
    assert_eq!(solution.boundary, restored);
}

#[test]
fn concurrent_solves_share_nothing() {
    // Each solve owns its buffers; parallel invocations must agree with
    // the sequential result.
    let params = option(OptionType::Put, 100.0, 100.0, 0.5, 0.05, 0.01, 0.3);
    let reference = KimSolver::with_defaults().solve(&params).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let p = params;
            std::thread::spawn(move || KimSolver::with_defaults().solve(&p).unwrap())
        })
        .collect();
    for handle in handles {
        let solution = handle.join().unwrap();
        assert_eq!(solution.boundary, reference.boundary);
    }
}

#[test]
fn solver_refines_the_qd_seed() {
    // The converged frontier should differ from the seed away from
    // expiry (the seed is only a first guess) while keeping its shape.
    let params = option(OptionType::Put, 100.0, 100.0, 1.0, 0.06, 0.0, 0.25);
    let grid_solution = KimSolver::with_defaults().solve(&params).unwrap();
    let seed = QdPlus::initial_boundaries(
        &params,
        &amopt_boundary::CollocationGrid::new(1.0, 24).unwrap(),
    )
    .unwrap();

    let refined = grid_solution.boundary.upper().value_at(1.0);
    let guessed = seed.upper().value_at(1.0);
    assert!(refined > 0.0 && guessed > 0.0);
    // Both sit below strike; the refinement moves the frontier.
    assert!(refined < 100.0 && guessed < 100.0);
    assert!((refined - guessed).abs() > 1e-6);
}
