//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the raw table handed over by the CSV harness (`RawTable`)
//! - validated applicant records and the cohort partition (`Applicant`, `Cohorts`)
//! - decisions and run configuration (`Decision`, `RunConfig`, etc.)

pub mod types;

pub use types::*;
