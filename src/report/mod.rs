//! Reporting: run report (JSON-serializable) and terminal formatting.

pub mod format;

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::{CohortStats, parity_ratio};

pub use format::*;

/// Row accounting for a run.
#[derive(Debug, Clone, Serialize)]
pub struct RowCounts {
    pub read: usize,
    pub used: usize,
    pub dropped: usize,
    pub unparseable: usize,
}

/// Machine-readable summary of a `fairlend run`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub input: PathBuf,
    pub target_rate: f64,
    pub risk_field: String,
    pub id_field: String,
    pub rows: RowCounts,
    /// Cohort key -> threshold; `null` for empty cohorts.
    pub thresholds: BTreeMap<String, Option<f64>>,
    pub statistics: Vec<CohortStats>,
    pub parity_ratio: Option<f64>,
}

impl RunReport {
    pub fn new(
        input: PathBuf,
        target_rate: f64,
        risk_field: &str,
        id_field: &str,
        rows: RowCounts,
        thresholds: &BTreeMap<String, f64>,
        statistics: Vec<CohortStats>,
    ) -> Self {
        let thresholds = thresholds
            .iter()
            .map(|(k, v)| (k.clone(), v.is_finite().then_some(*v)))
            .collect();
        let parity_ratio = parity_ratio(&statistics);
        Self {
            tool: "fairlend".to_string(),
            generated_at: Utc::now(),
            input,
            target_rate,
            risk_field: risk_field.to_string(),
            id_field: id_field.to_string(),
            rows,
            thresholds,
            statistics,
            parity_ratio,
        }
    }
}
