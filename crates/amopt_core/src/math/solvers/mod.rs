//! Root-finding solvers.
//!
//! A single well-understood bracketing algorithm (Brent's method) backs
//! every root-finding need in the engine, replacing ad hoc
//! Newton-then-bisection cascades with known worst-case behaviour.

pub mod brent;
pub mod config;
pub mod implied_vol;

pub use brent::BrentSolver;
pub use config::SolverConfig;
pub use implied_vol::solve_implied_volatility;
