//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the normalizer/engine code stays clean and testable
//! - output changes are localized (important for snapshot-style tests)

use std::path::Path;

use crate::audit::{AuditSummary, GroupRate};
use crate::cohort::DroppedRow;
use crate::engine::{CohortStats, parity_ratio};
use crate::io::ingest::RowError;
use crate::report::RowCounts;

const RULE_WIDTH: usize = 60;
const MIN_GROUP_WIDTH: usize = 20;
const MAX_LISTED_DROPS: usize = 10;

/// Header block: input, row accounting, target rate, parity.
pub fn format_run_summary(input: &Path, rows: &RowCounts, target_rate: f64, stats: &[CohortStats]) -> String {
    let mut out = String::new();

    out.push_str("=== fairlend - Equal-Outcome Cohort Thresholds ===\n");
    out.push_str(&format!("Input: {}\n", input.display()));
    out.push_str(&format!(
        "Rows: read={} | used={} | dropped={} | unparseable={}\n",
        rows.read, rows.used, rows.dropped, rows.unparseable
    ));
    out.push_str(&format!("Target approval rate: {:.1}%\n", target_rate * 100.0));

    let non_empty = stats.iter().filter(|s| !s.is_empty()).count();
    out.push_str(&format!("Cohorts: {} ({} empty)\n", stats.len(), stats.len() - non_empty));
    match parity_ratio(stats) {
        Some(p) => out.push_str(&format!("Parity ratio (min/max realized rate): {p:.3}\n")),
        None => out.push_str("Parity ratio (min/max realized rate): N/A\n"),
    }

    out
}

/// Statistics table, one row per cohort in key order.
pub fn format_statistics(stats: &[CohortStats]) -> String {
    let group_width = stats
        .iter()
        .map(|s| s.cohort.chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_GROUP_WIDTH);
    let width = (group_width + 49).max(RULE_WIDTH);

    let mut out = String::new();
    out.push_str(&"=".repeat(width));
    out.push('\n');
    out.push_str(&format!("{:^width$}\n", "Approval Statistics (Lower Ratios Are Better)").trim_end());
    out.push('\n');
    out.push_str(&"=".repeat(width));
    out.push('\n');
    out.push_str(&format!(
        "{:<group_width$} | {:>10} | {:>10} | {:>10} | {:>6}\n",
        "Group", "Applicants", "Max Ratio", "Approved", "Rate"
    ));
    out.push_str(&"-".repeat(width));
    out.push('\n');

    for s in stats {
        if s.is_empty() {
            out.push_str(&format!(
                "{:<group_width$} | {:>10} | {:>10} | {:>10} | {:>6}\n",
                s.cohort, "0", "N/A", "0", "0.0%"
            ));
            continue;
        }
        out.push_str(&format!(
            "{:<group_width$} | {:>10} | {:>10.2} | {:>10} | {:>6}\n",
            s.cohort,
            s.applicants,
            s.threshold,
            s.approved,
            format!("{:.1}%", s.rate_pct)
        ));
    }

    out
}

/// Rows left out of the run (normalizer drops and unparseable CSV records).
///
/// Returns an empty string when nothing was dropped.
pub fn format_dropped(dropped: &[DroppedRow], row_errors: &[RowError]) -> String {
    if dropped.is_empty() && row_errors.is_empty() {
        return String::new();
    }

    let mut lines: Vec<String> = row_errors
        .iter()
        .map(|e| format!("  line {}: {}", e.line, e.message))
        .collect();
    lines.extend(dropped.iter().map(|d| match &d.id {
        Some(id) => format!("  line {} (id {id}): {}", d.line, d.reason),
        None => format!("  line {}: {}", d.line, d.reason),
    }));

    let total = lines.len();
    let mut out = format!("Excluded rows ({total}):\n");
    for line in lines.iter().take(MAX_LISTED_DROPS) {
        out.push_str(line);
        out.push('\n');
    }
    if total > MAX_LISTED_DROPS {
        out.push_str(&format!("  ... and {} more\n", total - MAX_LISTED_DROPS));
    }
    out
}

/// Text report for `fairlend audit`.
pub fn format_audit(input: &Path, summary: &AuditSummary) -> String {
    let mut out = String::new();
    out.push_str("=== fairlend - Outcome Audit ===\n");
    out.push_str(&format!("Input: {}\n", input.display()));
    out.push_str(&format!("Rows: {}\n", summary.rows_read));

    if let Some(field) = &summary.outcome_field {
        out.push_str(&format!("\nApproval rate by race ({field}):\n"));
        out.push_str(&format_rates(&summary.by_race));
        out.push_str(&format!("\nApproval rate by sex ({field}):\n"));
        out.push_str(&format_rates(&summary.by_sex));
        if !summary.by_income.is_empty() {
            out.push_str(&format!("\nApproval rate by income group ({field}):\n"));
            out.push_str(&format_rates(&summary.by_income));
        }
    }

    if let Some(cs) = &summary.clear_score {
        out.push_str("\nClearScore (DTI approval rating by ethnicity):\n");
        out.push_str("  rating = clamp(1 - DTI / 50, 0, 1); ClearScore = min group mean / max group mean\n");
        for g in &cs.groups {
            out.push_str(&format!("  {:<32} n={:<8} mean={:.3}\n", g.group, g.rows, g.mean_rating).trim_end());
            out.push('\n');
        }
        out.push_str(&format!("  Minimum average rating: {:.3}\n", cs.min_mean));
        out.push_str(&format!("  Maximum average rating: {:.3}\n", cs.max_mean));
        match cs.score {
            Some(score) => out.push_str(&format!("  ClearScore: {score:.3}\n")),
            None => out.push_str("  ClearScore: N/A (maximum average rating is 0)\n"),
        }
    }

    out
}

fn format_rates(rates: &[GroupRate]) -> String {
    if rates.is_empty() {
        return "  (no rows)\n".to_string();
    }
    let mut out = String::new();
    for r in rates {
        out.push_str(&format!(
            "  {:<32} {:>6.1}%  ({} of {})\n",
            truncate(&r.group, 32),
            r.rate * 100.0,
            r.approved,
            r.rows
        ));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
