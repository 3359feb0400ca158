//! Outcome audit of historical decisions.
//!
//! Where the threshold engine *sets* outcomes, the audit *measures* the ones
//! already in the data:
//!
//! - observed approval rate by race, by sex and by income quartile, where a
//!   row counts as approved when its outcome column equals the approved code
//! - a DTI approval rating `clamp(1 - dti / 50, 0, 1)` averaged per ethnicity,
//!   summarized as ClearScore = lowest mean / highest mean (1.0 = parity)
//!
//! All numbers are simple group means; no thresholds are computed here.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::domain::{AuditConfig, COL_ETHNICITY, COL_RACE, COL_SEX, RawRow, RawTable, normalize_header_name, parse_finite};
use crate::error::FairnessError;
use crate::math::{percentile_linear, sorted};

/// DTI at which the approval rating reaches zero.
pub const DTI_RATING_SPAN: f64 = 50.0;

pub const INCOME_COLUMN: &str = "income";
pub const INCOME_QUARTILES: [&str; 4] = ["Low", "Medium", "High", "Very High"];

/// Observed approval rate for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRate {
    pub group: String,
    pub rows: usize,
    pub approved: usize,
    /// Fraction in `[0, 1]`.
    pub rate: f64,
}

/// Mean DTI approval rating for one ethnicity group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRating {
    pub group: String,
    pub rows: usize,
    pub mean_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearScore {
    pub groups: Vec<GroupRating>,
    pub min_mean: f64,
    pub max_mean: f64,
    /// `min_mean / max_mean`; `None` when the highest mean is 0.
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditSummary {
    pub rows_read: usize,
    pub outcome_field: Option<String>,
    pub by_race: Vec<GroupRate>,
    pub by_sex: Vec<GroupRate>,
    pub by_income: Vec<GroupRate>,
    pub clear_score: Option<ClearScore>,
}

/// Convert a debt-to-income ratio into a rating in `[0, 1]` (1 = best).
pub fn dti_approval_rating(dti: f64) -> f64 {
    (1.0 - dti / DTI_RATING_SPAN).clamp(0.0, 1.0)
}

/// Run every audit section the table has columns for.
pub fn run_audit(table: &RawTable, config: &AuditConfig) -> Result<AuditSummary, FairnessError> {
    let header_map = table.header_map();
    let present = table.normalized_headers();

    let outcome_col = header_map.get(&normalize_header_name(&config.outcome_field)).copied();
    let risk_col = header_map.get(&normalize_header_name(&config.risk_field)).copied();
    if outcome_col.is_none() && risk_col.is_none() {
        return Err(FairnessError::Schema {
            missing: normalize_header_name(&config.outcome_field),
            present,
        });
    }

    let require = |name: &str| -> Result<usize, FairnessError> {
        header_map.get(name).copied().ok_or_else(|| FairnessError::Schema {
            missing: name.to_string(),
            present: present.clone(),
        })
    };

    let mut summary = AuditSummary {
        rows_read: table.len(),
        outcome_field: None,
        by_race: Vec::new(),
        by_sex: Vec::new(),
        by_income: Vec::new(),
        clear_score: None,
    };

    if let Some(outcome) = outcome_col {
        let race = require(COL_RACE)?;
        let sex = require(COL_SEX)?;
        let approved = |row: &RawRow| is_approved(row.cell(outcome), &config.approved_code);

        summary.outcome_field = Some(normalize_header_name(&config.outcome_field));
        summary.by_race = outcome_rates(table, race, approved);
        summary.by_sex = outcome_rates(table, sex, approved);
        if let Some(income) = header_map.get(INCOME_COLUMN).copied() {
            summary.by_income = income_quartile_rates(table, income, approved);
        }
    }

    if let Some(risk) = risk_col {
        let ethnicity = require(COL_ETHNICITY)?;
        summary.clear_score = clear_score(table, ethnicity, risk);
    }

    debug!(
        rows = summary.rows_read,
        race_groups = summary.by_race.len(),
        sex_groups = summary.by_sex.len(),
        "outcome audit complete"
    );
    Ok(summary)
}

/// Approval rate per distinct value of column `group_col`, highest first.
///
/// Rows with a blank group cell are left out.
pub fn outcome_rates(table: &RawTable, group_col: usize, approved: impl Fn(&RawRow) -> bool) -> Vec<GroupRate> {
    let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for row in &table.rows {
        let Some(group) = row.cell(group_col) else { continue };
        let entry = counts.entry(group).or_default();
        entry.0 += 1;
        if approved(row) {
            entry.1 += 1;
        }
    }
    let mut rates: Vec<GroupRate> = counts
        .into_iter()
        .map(|(group, (rows, approved))| GroupRate {
            group: group.to_string(),
            rows,
            approved,
            rate: approved as f64 / rows as f64,
        })
        .collect();
    rates.sort_by(|a, b| b.rate.total_cmp(&a.rate).then_with(|| a.group.cmp(&b.group)));
    rates
}

/// Approval rate per income quartile (Low .. Very High).
///
/// Quartile edges are the 25/50/75th linear percentiles of the numeric
/// incomes; a value on an edge belongs to the lower bin. Rows with a
/// non-numeric income are skipped.
pub fn income_quartile_rates(
    table: &RawTable,
    income_col: usize,
    approved: impl Fn(&RawRow) -> bool,
) -> Vec<GroupRate> {
    let scored: Vec<(f64, &RawRow)> = table
        .rows
        .iter()
        .filter_map(|row| row.cell(income_col).and_then(parse_finite).map(|v| (v, row)))
        .collect();
    if scored.is_empty() {
        return Vec::new();
    }

    let incomes = sorted(&scored.iter().map(|(v, _)| *v).collect::<Vec<_>>());
    let edges: Vec<f64> = [0.25, 0.5, 0.75]
        .iter()
        .filter_map(|q| percentile_linear(&incomes, *q))
        .collect();

    let mut counts = [(0usize, 0usize); 4];
    for (income, row) in &scored {
        let bin = edges.iter().position(|edge| income <= edge).unwrap_or(3);
        counts[bin].0 += 1;
        if approved(*row) {
            counts[bin].1 += 1;
        }
    }

    INCOME_QUARTILES
        .iter()
        .zip(counts)
        .filter(|(_, (rows, _))| *rows > 0)
        .map(|(label, (rows, approved))| GroupRate {
            group: label.to_string(),
            rows,
            approved,
            rate: approved as f64 / rows as f64,
        })
        .collect()
}

/// Mean DTI approval rating per ethnicity and the min/max ratio between them.
///
/// Rows with a blank ethnicity or a non-numeric DTI are skipped. Returns
/// `None` when no row survives.
pub fn clear_score(table: &RawTable, ethnicity_col: usize, risk_col: usize) -> Option<ClearScore> {
    let mut sums: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for row in &table.rows {
        let (Some(group), Some(dti)) = (row.cell(ethnicity_col), row.cell(risk_col).and_then(parse_finite)) else {
            continue;
        };
        let entry = sums.entry(group).or_default();
        entry.0 += 1;
        entry.1 += dti_approval_rating(dti);
    }
    if sums.is_empty() {
        return None;
    }

    let groups: Vec<GroupRating> = sums
        .into_iter()
        .map(|(group, (rows, total))| GroupRating {
            group: group.to_string(),
            rows,
            mean_rating: total / rows as f64,
        })
        .collect();
    let min_mean = groups.iter().map(|g| g.mean_rating).fold(f64::INFINITY, f64::min);
    let max_mean = groups.iter().map(|g| g.mean_rating).fold(f64::NEG_INFINITY, f64::max);
    let score = (max_mean > 0.0).then(|| min_mean / max_mean);

    Some(ClearScore {
        groups,
        min_mean,
        max_mean,
        score,
    })
}

fn is_approved(cell: Option<&str>, code: &str) -> bool {
    let Some(cell) = cell else { return false };
    if cell == code.trim() {
        return true;
    }
    match (parse_finite(cell), parse_finite(code)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> AuditConfig {
        AuditConfig {
            input: PathBuf::from("unused.csv"),
            outcome_field: "action_taken".to_string(),
            approved_code: "1".to_string(),
            risk_field: "debt_to_income_ratio".to_string(),
            export: None,
            export_rates: None,
        }
    }

    fn hmda_table() -> RawTable {
        RawTable::from_rows(
            ["derived_ethnicity", "derived_race", "derived_sex", "debt_to_income_ratio", "action_taken", "income"],
            vec![
                ["Not Hispanic or Latino", "White", "Male", "25", "1", "40"],
                ["Not Hispanic or Latino", "White", "Female", "50", "3", "60"],
                ["Hispanic or Latino", "White", "Male", "10", "1", "80"],
                ["Hispanic or Latino", "Asian", "Female", "Exempt", "1.0", "100"],
                ["Not Hispanic or Latino", "Asian", "Male", "0", "3", "n/a"],
            ],
        )
    }

    #[test]
    fn dti_rating_is_clamped() {
        assert_eq!(dti_approval_rating(0.0), 1.0);
        assert_eq!(dti_approval_rating(25.0), 0.5);
        assert_eq!(dti_approval_rating(50.0), 0.0);
        assert_eq!(dti_approval_rating(80.0), 0.0);
        assert_eq!(dti_approval_rating(-10.0), 1.0);
    }

    #[test]
    fn rates_by_race_sorted_descending() {
        let summary = run_audit(&hmda_table(), &config()).unwrap();
        let race: Vec<(&str, usize, usize)> =
            summary.by_race.iter().map(|g| (g.group.as_str(), g.rows, g.approved)).collect();
        // White: 2 of 3; Asian: 1 of 2 ("1.0" matches code "1").
        assert_eq!(race, vec![("White", 3, 2), ("Asian", 2, 1)]);
        assert_eq!(summary.outcome_field.as_deref(), Some("action_taken"));
    }

    #[test]
    fn income_quartiles_use_numeric_incomes_only() {
        let summary = run_audit(&hmda_table(), &config()).unwrap();
        // Incomes 40, 60, 80, 100 -> edges 55, 70, 85.
        let bins: Vec<(&str, usize)> = summary.by_income.iter().map(|g| (g.group.as_str(), g.rows)).collect();
        assert_eq!(bins, vec![("Low", 1), ("Medium", 1), ("High", 1), ("Very High", 1)]);
    }

    #[test]
    fn clear_score_compares_ethnicity_means() {
        let summary = run_audit(&hmda_table(), &config()).unwrap();
        let cs = summary.clear_score.unwrap();
        // Hispanic: [0.8] (Exempt skipped); Not Hispanic: [0.5, 0.0, 1.0].
        assert_eq!(cs.groups.len(), 2);
        assert!((cs.max_mean - 0.8).abs() < 1e-12);
        assert!((cs.min_mean - 0.5).abs() < 1e-12);
        assert!((cs.score.unwrap() - 0.625).abs() < 1e-12);
    }

    #[test]
    fn clear_score_is_none_when_all_ratings_zero() {
        let t = RawTable::from_rows(["derived_ethnicity", "debt_to_income_ratio"], vec![["A", "60"], ["B", "75"]]);
        let summary = run_audit(&t, &config()).unwrap();
        assert_eq!(summary.clear_score.unwrap().score, None);
        assert!(summary.by_race.is_empty());
    }

    #[test]
    fn needs_outcome_or_risk_column() {
        let t = RawTable::from_rows(["derived_race", "derived_sex"], vec![["White", "Male"]]);
        let err = run_audit(&t, &config()).unwrap_err();
        assert!(matches!(err, FairnessError::Schema { ref missing, .. } if missing == "action_taken"));
    }

    #[test]
    fn outcome_section_requires_race_column() {
        let t = RawTable::from_rows(["derived_sex", "action_taken"], vec![["Male", "1"]]);
        let err = run_audit(&t, &config()).unwrap_err();
        assert!(matches!(err, FairnessError::Schema { ref missing, .. } if missing == "derived_race"));
    }
}
