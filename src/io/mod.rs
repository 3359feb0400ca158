//! Input/output helpers.
//!
//! - CSV ingest into a raw table (`ingest`)
//! - decision / statistics / report exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
