//! CLI command implementations.

pub mod boundary;
pub mod heston;
pub mod iv;
pub mod price;
pub mod spread;
