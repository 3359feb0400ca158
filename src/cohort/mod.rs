//! Cohort normalizer.
//!
//! - cohort key rules (`key`)
//! - raw table -> validated, cohort-keyed applicants (`normalize`)

pub mod key;
pub mod normalize;

pub use key::*;
pub use normalize::*;
