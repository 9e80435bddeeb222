//! # amopt_boundary: Free-Boundary Solver for American Options
//!
//! Determines the early-exercise frontier of an American option,
//! including the double-boundary (exercise band) regime that arises under
//! negative interest rates, via:
//!
//! 1. **QD+ approximation** (`qdplus`): a closed-form, iteration-free
//!    guess for the boundary at each collocation time, extended for
//!    negative rates, plus the QD+-only price used in the near-expiry
//!    regime.
//! 2. **Kim-integral solver** (`solver`): fixed-point refinement of the
//!    QD+ guess on the Kim (1990) value-matching integral equation,
//!    evaluated with the adaptive quadrature core at every collocation
//!    point until the boundary stops moving.
//!
//! Everything is solved in put coordinates; calls enter through the
//! McDonald-Schroder symmetry `C(S, K, r, q) = P(K, S, q, r)` and their
//! boundaries are reported back in call coordinates.
//!
//! The solver is stateless across calls: each `solve` owns its working
//! buffers, so concurrent solves from multiple threads need no
//! synchronisation.

pub mod boundary;
pub mod collocation;
pub mod qdplus;
pub mod solver;

pub use boundary::{BoundaryCurve, ExerciseBoundary};
pub use collocation::CollocationGrid;
pub use qdplus::{ExerciseRegime, QdPlus};
pub use solver::{BoundarySolution, KimSolver, KimSolverConfig, SolverStatus};
