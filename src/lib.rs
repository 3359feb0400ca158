//! `fairlend` library crate.
//!
//! The binary (`fairlend`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the normalizer and engine can be driven from any table source
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod audit;
pub mod cli;
pub mod cohort;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
