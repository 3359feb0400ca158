//! Mathematical utilities: order statistics.

pub mod percentile;

pub use percentile::*;
