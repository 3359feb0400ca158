//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - built once by the normalizer and shared read-only with the engine
//! - exported to JSON/CSV
//! - constructed directly in tests without going through a CSV file

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default name of the risk (debt-to-income) column.
pub const DEFAULT_RISK_FIELD: &str = "debt_to_income_ratio";
/// Default name of the applicant id column.
pub const DEFAULT_ID_FIELD: &str = "id";

pub const COL_ETHNICITY: &str = "derived_ethnicity";
pub const COL_RACE: &str = "derived_race";
pub const COL_SEX: &str = "derived_sex";

/// Per-applicant outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Denied,
}

impl Decision {
    /// Apply a cohort cutoff. Values exactly at the cutoff are approved.
    pub fn at_cutoff(risk: f64, threshold: f64) -> Self {
        if risk <= threshold {
            Decision::Approved
        } else {
            Decision::Denied
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Denied => "denied",
        }
    }

    pub fn is_approved(self) -> bool {
        self == Decision::Approved
    }
}

/// Normalize a header name for matching: trimmed, BOM-stripped, lower-case.
pub fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}').trim();
    name.to_lowercase()
}

/// One raw input row with its 1-based source line (header is line 1).
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub line: usize,
    /// 0-based position among the source's data records, counting records
    /// that failed to parse.
    pub record: usize,
    pub cells: Vec<String>,
}

/// Untyped tabular input: raw header names plus string cells.
///
/// This is the boundary between the CSV harness and the normalizer; anything
/// that can produce headers and rows (a CSV file, a test fixture) can feed it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Build a table from in-memory rows, numbering lines as a CSV file would.
    pub fn from_rows<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let headers = headers.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(idx, cells)| RawRow {
                line: idx + 2,
                record: idx,
                cells: cells.into_iter().map(Into::into).collect(),
            })
            .collect();
        Self { headers, rows }
    }

    /// Normalized header name -> column index. The first occurrence wins.
    pub fn header_map(&self) -> HashMap<String, usize> {
        let mut map = HashMap::new();
        for (idx, name) in self.headers.iter().enumerate() {
            map.entry(normalize_header_name(name)).or_insert(idx);
        }
        map
    }

    /// Normalized header names in source order.
    pub fn normalized_headers(&self) -> Vec<String> {
        self.headers.iter().map(|h| normalize_header_name(h)).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RawRow {
    /// Trimmed, non-empty cell at `idx`.
    pub fn cell(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).map(|s| s.trim()).filter(|s| !s.is_empty())
    }
}

/// Header renames applied before schema validation, plus the names of the
/// risk and id columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAliases {
    pub risk_field: String,
    pub id_field: String,
    /// Normalized alias -> normalized canonical column name.
    pub renames: BTreeMap<String, String>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            risk_field: DEFAULT_RISK_FIELD.to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            renames: BTreeMap::new(),
        }
    }
}

impl ColumnAliases {
    pub fn with_rename(mut self, alias: &str, canonical: &str) -> Self {
        self.renames
            .insert(normalize_header_name(alias), normalize_header_name(canonical));
        self
    }

    /// Canonical name for a normalized header.
    pub fn resolve<'a>(&'a self, header: &'a str) -> &'a str {
        self.renames.get(header).map(String::as_str).unwrap_or(header)
    }
}

/// A validated applicant record.
#[derive(Debug, Clone, PartialEq)]
pub struct Applicant {
    pub id: String,
    /// Name of the column `id` was read from (or synthesized under).
    pub id_field: String,
    /// Name of the column `risk_ratio` was read from.
    pub risk_field: String,
    /// Debt-to-income ratio; `None` when the input had no risk column.
    pub risk_ratio: Option<f64>,

    pub race_raw: String,
    pub ethnicity_raw: String,
    pub sex_raw: String,

    pub cohort_race: String,
    pub cohort_sex: String,

    /// Every other input column, keyed by normalized header name.
    pub extra: BTreeMap<String, String>,
}

impl Applicant {
    pub fn cohort_key(&self) -> String {
        crate::cohort::cohort_key(&self.cohort_race, &self.cohort_sex)
    }

    /// Risk value for `field`: the modeled ratio when `field` names the risk
    /// column, otherwise a finite number parsed from the attribute bag.
    pub fn risk_value(&self, field: &str) -> Result<f64, String> {
        let field = normalize_header_name(field);
        if field == normalize_header_name(&self.risk_field) {
            return match self.risk_ratio {
                Some(v) if v.is_finite() => Ok(v),
                Some(v) => Err(format!("non-finite `{field}` value {v}")),
                None => Err(format!("missing `{field}` value")),
            };
        }
        let raw = self
            .extra
            .get(&field)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("missing `{field}` value"))?;
        parse_finite(raw).ok_or_else(|| format!("non-numeric `{field}` value '{raw}'"))
    }

    /// Identifier under `field`: the modeled id for the id column, otherwise a
    /// non-empty attribute from the bag.
    pub fn id_value(&self, field: &str) -> Option<&str> {
        let field = normalize_header_name(field);
        if field == normalize_header_name(&self.id_field) {
            return Some(self.id.as_str());
        }
        self.extra
            .get(&field)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// Parse a finite float, rejecting NaN and infinities.
pub fn parse_finite(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Cohort key -> members. Ordered so reports and exports are stable.
pub type Cohorts = BTreeMap<String, Vec<Applicant>>;

/// A full `fairlend run` configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub approval_rate: f64,
    pub columns: ColumnAliases,

    /// Cohorts that must appear in the output even when nobody falls in them.
    pub expected_cohorts: Vec<String>,

    pub decisions_out: Option<PathBuf>,
    pub export_stats: Option<PathBuf>,
    pub export_report: Option<PathBuf>,

    pub chart: bool,
    pub chart_width: usize,
}

impl RunConfig {
    pub fn new(input: impl Into<PathBuf>, approval_rate: f64) -> Self {
        Self {
            input: input.into(),
            approval_rate,
            columns: ColumnAliases::default(),
            expected_cohorts: Vec::new(),
            decisions_out: None,
            export_stats: None,
            export_report: None,
            chart: false,
            chart_width: 50,
        }
    }
}

/// Configuration for `fairlend audit`.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub input: PathBuf,
    pub outcome_field: String,
    pub approved_code: String,
    pub risk_field: String,
    pub export: Option<PathBuf>,
    /// Observed approval rates as CSV, one row per (grouping, group).
    pub export_rates: Option<PathBuf>,
}

/// Configuration for `fairlend sample`.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub count: usize,
    pub seed: u64,
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applicant() -> Applicant {
        let mut extra = BTreeMap::new();
        extra.insert("loan_id".to_string(), "L-7".to_string());
        extra.insert("alt_ratio".to_string(), "abc".to_string());
        Applicant {
            id: "7".to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            risk_field: DEFAULT_RISK_FIELD.to_string(),
            risk_ratio: Some(31.0),
            race_raw: "white".to_string(),
            ethnicity_raw: "Not Hispanic or Latino".to_string(),
            sex_raw: "male".to_string(),
            cohort_race: "White".to_string(),
            cohort_sex: "Male".to_string(),
            extra,
        }
    }

    #[test]
    fn decision_cutoff_is_inclusive() {
        assert_eq!(Decision::at_cutoff(25.0, 25.0), Decision::Approved);
        assert_eq!(Decision::at_cutoff(25.000001, 25.0), Decision::Denied);
        assert_eq!(Decision::at_cutoff(0.0, f64::NEG_INFINITY), Decision::Denied);
    }

    #[test]
    fn decision_serializes_as_literal_strings() {
        let json = serde_json::to_string(&[Decision::Approved, Decision::Denied]).unwrap();
        assert_eq!(json, r#"["approved","denied"]"#);
    }

    #[test]
    fn header_names_ignore_case_space_and_bom() {
        assert_eq!(normalize_header_name("\u{feff} Derived_Race "), "derived_race");
        assert_eq!(normalize_header_name("ID"), "id");
    }

    #[test]
    fn risk_value_reads_modeled_field_and_bag() {
        let a = applicant();
        assert_eq!(a.risk_value("Debt_To_Income_Ratio"), Ok(31.0));
        assert!(a.risk_value("alt_ratio").unwrap_err().contains("non-numeric"));
        assert!(a.risk_value("missing").unwrap_err().contains("missing"));
    }

    #[test]
    fn id_value_falls_back_to_bag() {
        let a = applicant();
        assert_eq!(a.id_value("id"), Some("7"));
        assert_eq!(a.id_value("loan_id"), Some("L-7"));
        assert_eq!(a.id_value("nope"), None);
    }

    #[test]
    fn parse_finite_rejects_non_numbers() {
        assert_eq!(parse_finite(" 36 "), Some(36.0));
        assert_eq!(parse_finite("Exempt"), None);
        assert_eq!(parse_finite("inf"), None);
        assert_eq!(parse_finite("NaN"), None);
    }
}
