//! Threshold engine.
//!
//! Responsibilities:
//!
//! - compute one percentile cutoff per cohort for a target approval rate
//! - turn cutoffs into per-applicant decisions (parallel across cohorts)
//! - project the result into a per-cohort statistics table

pub mod stats;
pub mod thresholds;

pub use stats::*;
pub use thresholds::*;
