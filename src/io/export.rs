//! Result exports.
//!
//! - decisions JSON: `{ "<id>": "approved" | "denied", ... }`
//! - statistics CSV: one row per cohort
//! - run report JSON: configuration, counts, thresholds and statistics
//! - audit approval rates CSV: one row per (grouping, group)
//! - raw tables as CSV (used by `fairlend sample`)
//!
//! Exports are meant to be easy to consume in spreadsheets or audit tooling.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::audit::AuditSummary;
use crate::domain::{Decision, RawTable};
use crate::engine::CohortStats;
use crate::error::AppError;
use crate::report::RunReport;

/// Write the decision map as pretty-printed JSON.
pub fn write_decisions_json(path: &Path, decisions: &BTreeMap<String, Decision>) -> Result<(), AppError> {
    let file = create(path, "decisions JSON")?;
    serde_json::to_writer_pretty(file, decisions)
        .map_err(|e| AppError::new(4, format!("Failed to write decisions JSON: {e}")))?;
    info!(path = %path.display(), decisions = decisions.len(), "wrote decisions");
    Ok(())
}

/// Write the per-cohort statistics table as CSV.
///
/// The threshold cell is left empty for empty cohorts.
pub fn write_stats_csv(path: &Path, stats: &[CohortStats]) -> Result<(), AppError> {
    let file = create(path, "statistics CSV")?;
    let mut writer = csv::Writer::from_writer(file);
    let write_err = |e: csv::Error| AppError::new(4, format!("Failed to write statistics CSV: {e}"));

    writer
        .write_record(["group", "applicants", "threshold", "approved", "rate_pct"])
        .map_err(write_err)?;
    for s in stats {
        let threshold = if s.threshold.is_finite() {
            format!("{:.4}", s.threshold)
        } else {
            String::new()
        };
        writer
            .write_record([
                s.cohort.clone(),
                s.applicants.to_string(),
                threshold,
                s.approved.to_string(),
                format!("{:.1}", s.rate_pct),
            ])
            .map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to write statistics CSV: {e}")))?;
    Ok(())
}

/// Write the run report as pretty-printed JSON.
pub fn write_report_json(path: &Path, report: &RunReport) -> Result<(), AppError> {
    let file = create(path, "report JSON")?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(4, format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

/// Write the audit's observed approval rates as CSV.
///
/// Columns: `grouping,group,rows,approved,rate_pct`, with grouping one of
/// `race`, `sex`, `income`.
pub fn write_audit_rates_csv(path: &Path, summary: &AuditSummary) -> Result<(), AppError> {
    let file = create(path, "audit rates CSV")?;
    let mut writer = csv::Writer::from_writer(file);
    let write_err = |e: csv::Error| AppError::new(4, format!("Failed to write audit rates CSV: {e}"));

    writer
        .write_record(["grouping", "group", "rows", "approved", "rate_pct"])
        .map_err(write_err)?;
    let sections = [("race", &summary.by_race), ("sex", &summary.by_sex), ("income", &summary.by_income)];
    for (grouping, rates) in sections {
        for r in rates {
            writer
                .write_record([
                    grouping.to_string(),
                    r.group.clone(),
                    r.rows.to_string(),
                    r.approved.to_string(),
                    format!("{:.1}", r.rate * 100.0),
                ])
                .map_err(write_err)?;
        }
    }
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to write audit rates CSV: {e}")))?;
    Ok(())
}

/// Write a raw table (headers + cells) as CSV.
pub fn write_table_csv(path: &Path, table: &RawTable) -> Result<(), AppError> {
    let file = create(path, "CSV")?;
    let mut writer = csv::Writer::from_writer(file);
    let write_err = |e: csv::Error| AppError::new(4, format!("Failed to write CSV: {e}"));

    writer.write_record(&table.headers).map_err(write_err)?;
    for row in &table.rows {
        writer.write_record(&row.cells).map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to write CSV: {e}")))?;
    Ok(())
}

/// Write plain text (audit summaries).
pub fn write_text(path: &Path, text: &str) -> Result<(), AppError> {
    let mut file = create(path, "text file")?;
    file.write_all(text.as_bytes())
        .map_err(|e| AppError::new(4, format!("Failed to write '{}': {e}", path.display())))?;
    Ok(())
}

fn create(path: &Path, what: &str) -> Result<File, AppError> {
    File::create(path).map_err(|e| AppError::new(4, format!("Failed to create {what} '{}': {e}", path.display())))
}
