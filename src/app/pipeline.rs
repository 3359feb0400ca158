//! Shared "threshold pipeline" logic used by the CLI and the integration tests.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> normalize -> expected cohorts -> thresholds -> statistics
//!
//! Front-ends can then focus on presentation (printing vs exporting).

use tracing::{info, warn};

use crate::cohort::{NormalizedCohorts, canonical_key, normalize};
use crate::domain::RunConfig;
use crate::engine::{CohortStats, ThresholdOutcome, compute_thresholds, summarize, validate_rate};
use crate::error::AppError;
use crate::io::ingest::{IngestedTable, read_table};
use crate::report::{RowCounts, RunReport};

/// All computed outputs of a single `fairlend run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedTable,
    pub normalized: NormalizedCohorts,
    pub outcome: ThresholdOutcome,
    pub stats: Vec<CohortStats>,
}

impl RunOutput {
    pub fn row_counts(&self) -> RowCounts {
        RowCounts {
            read: self.ingest.rows_read,
            used: self.normalized.rows_used,
            dropped: self.normalized.dropped_count(),
            unparseable: self.ingest.row_errors.len(),
        }
    }

    /// Build the machine-readable report for this run.
    pub fn report(&self, config: &RunConfig) -> RunReport {
        RunReport::new(
            config.input.clone(),
            config.approval_rate,
            &config.columns.risk_field,
            &config.columns.id_field,
            self.row_counts(),
            &self.outcome.thresholds,
            self.stats.clone(),
        )
    }
}

/// Execute the full pipeline for the CSV named in `config`.
pub fn run_thresholds(config: &RunConfig) -> Result<RunOutput, AppError> {
    // Fail on a bad rate before touching the file.
    validate_rate(config.approval_rate)?;

    let ingest = read_table(&config.input)?;
    run_thresholds_on_table(ingest, config)
}

/// Execute the pipeline on an already-ingested table.
pub fn run_thresholds_on_table(ingest: IngestedTable, config: &RunConfig) -> Result<RunOutput, AppError> {
    validate_rate(config.approval_rate)?;

    if ingest.table.is_empty() {
        warn!(input = %config.input.display(), "input has no data rows");
    }
    let mut normalized = normalize(&ingest.table, &config.columns)?;

    for raw in &config.expected_cohorts {
        let key = canonical_key(raw);
        if !key.is_empty() {
            normalized.ensure_cohort(key);
        }
    }

    let outcome = compute_thresholds(
        &normalized.cohorts,
        config.approval_rate,
        &config.columns.risk_field,
        &config.columns.id_field,
    )?;
    let stats = summarize(&normalized.cohorts, &outcome, &config.columns.id_field);

    info!(
        rows = ingest.rows_read,
        used = normalized.rows_used,
        cohorts = stats.len(),
        "run complete"
    );

    Ok(RunOutput {
        ingest,
        normalized,
        outcome,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decision, RawTable};

    fn ingest(rows: Vec<[&str; 5]>) -> IngestedTable {
        let n = rows.len();
        IngestedTable {
            table: RawTable::from_rows(
                ["id", "derived_ethnicity", "derived_race", "derived_sex", "debt_to_income_ratio"],
                rows,
            ),
            row_errors: Vec::new(),
            rows_read: n,
        }
    }

    #[test]
    fn expected_cohorts_appear_as_zero_rows() {
        let mut config = RunConfig::new("mem.csv", 0.5);
        config.expected_cohorts = vec!["asian   female".to_string(), "  ".to_string()];

        let out = run_thresholds_on_table(
            ingest(vec![
                ["1", "Not Hispanic or Latino", "White", "Male", "10"],
                ["2", "Not Hispanic or Latino", "White", "Male", "40"],
            ]),
            &config,
        )
        .unwrap();

        let keys: Vec<&str> = out.stats.iter().map(|s| s.cohort.as_str()).collect();
        assert_eq!(keys, vec!["Asian Female", "White Male"]);
        assert!(out.stats[0].is_empty());
        assert_eq!(out.outcome.thresholds["Asian Female"], f64::NEG_INFINITY);
        assert_eq!(out.outcome.decisions["1"], Decision::Approved);
        assert_eq!(out.outcome.decisions["2"], Decision::Denied);
    }

    #[test]
    fn expected_cohort_merges_with_spaced_source_labels() {
        let mut config = RunConfig::new("mem.csv", 0.5);
        config.expected_cohorts = vec!["Black Or African American Female".to_string()];

        let out = run_thresholds_on_table(
            ingest(vec![["1", "Not Hispanic or Latino", "Black  or African American", "Female", "10"]]),
            &config,
        )
        .unwrap();

        assert_eq!(out.stats.len(), 1);
        assert_eq!(out.stats[0].cohort, "Black Or African American Female");
        assert_eq!(out.stats[0].applicants, 1);
    }

    #[test]
    fn bad_rate_is_config_exit_code() {
        let config = RunConfig::new("does-not-exist.csv", 1.5);
        let err = run_thresholds(&config).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn row_counts_include_drops() {
        let config = RunConfig::new("mem.csv", 0.5);
        let out = run_thresholds_on_table(
            ingest(vec![
                ["1", "Not Hispanic or Latino", "White", "Male", "10"],
                ["2", "Not Hispanic or Latino", "White", "Male", "Exempt"],
            ]),
            &config,
        )
        .unwrap();
        let rows = out.row_counts();
        assert_eq!((rows.read, rows.used, rows.dropped, rows.unparseable), (2, 1, 1, 0));

        let report = out.report(&config);
        assert_eq!(report.thresholds["White Male"], Some(10.0));
    }
}
