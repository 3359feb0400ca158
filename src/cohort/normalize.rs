//! Raw table -> cohort partition.
//!
//! This module is responsible for turning a loosely-typed applicant table into
//! validated `Applicant` records grouped by cohort key.
//!
//! Design goals:
//! - **Strict schema** for the demographic columns (clear `Schema` errors)
//! - **Row-level validation** (drop rows with unusable risk values, but report
//!   every drop)
//! - **Deterministic behavior** (ids and grouping depend only on input order
//!   and content)
//! - **Separation of concerns**: no threshold logic here

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::cohort::key::{cohort_race, cohort_sex};
use crate::domain::{
    Applicant, COL_ETHNICITY, COL_RACE, COL_SEX, ColumnAliases, Cohorts, RawRow, RawTable,
    normalize_header_name, parse_finite,
};
use crate::error::FairnessError;

/// A row excluded during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRow {
    pub line: usize,
    pub id: Option<String>,
    pub reason: String,
}

/// Normalizer output: cohorts plus what was left out.
#[derive(Debug, Clone)]
pub struct NormalizedCohorts {
    pub cohorts: Cohorts,
    pub dropped: Vec<DroppedRow>,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Whether the input carried the risk column at all.
    pub has_risk_column: bool,
}

impl NormalizedCohorts {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    /// Insert an empty cohort under `key` unless it already exists.
    pub fn ensure_cohort(&mut self, key: String) {
        self.cohorts.entry(key).or_default();
    }
}

/// Resolved column positions for one table.
struct Columns {
    ethnicity: usize,
    race: usize,
    sex: usize,
    id: Option<usize>,
    risk: Option<usize>,
    /// Every other column: (normalized name, index).
    rest: Vec<(String, usize)>,
}

/// Partition `table` into cohorts.
///
/// Fails with [`FairnessError::Schema`] when a demographic column is missing.
/// Rows whose risk value is present but unusable are dropped and listed in
/// [`NormalizedCohorts::dropped`].
pub fn normalize(table: &RawTable, aliases: &ColumnAliases) -> Result<NormalizedCohorts, FairnessError> {
    let columns = resolve_columns(table, aliases)?;
    let id_field = normalize_header_name(&aliases.id_field);
    let risk_field = normalize_header_name(&aliases.risk_field);

    let mut cohorts: Cohorts = BTreeMap::new();
    let mut dropped = Vec::new();

    for row in &table.rows {
        match build_applicant(row, &columns, &id_field, &risk_field) {
            Ok(applicant) => cohorts.entry(applicant.cohort_key()).or_default().push(applicant),
            Err(drop) => {
                debug!(line = drop.line, id = ?drop.id, reason = %drop.reason, "dropping row");
                dropped.push(drop);
            }
        }
    }

    let rows_read = table.rows.len();
    let rows_used = rows_read - dropped.len();
    if !dropped.is_empty() {
        warn!(dropped = dropped.len(), rows_read, "rows excluded during normalization");
    }
    debug!(cohorts = cohorts.len(), rows_used, "normalized applicant table");

    Ok(NormalizedCohorts {
        cohorts,
        dropped,
        rows_read,
        rows_used,
        has_risk_column: columns.risk.is_some(),
    })
}

fn resolve_columns(table: &RawTable, aliases: &ColumnAliases) -> Result<Columns, FairnessError> {
    let mut header_map: HashMap<String, usize> = HashMap::new();
    let mut present = Vec::with_capacity(table.headers.len());
    for (idx, name) in table.normalized_headers().into_iter().enumerate() {
        let canonical = aliases.resolve(&name).to_string();
        present.push(canonical.clone());
        header_map.entry(canonical).or_insert(idx);
    }

    let require = |name: &str| -> Result<usize, FairnessError> {
        header_map.get(name).copied().ok_or_else(|| FairnessError::Schema {
            missing: name.to_string(),
            present: present.clone(),
        })
    };

    let ethnicity = require(COL_ETHNICITY)?;
    let race = require(COL_RACE)?;
    let sex = require(COL_SEX)?;
    let id = header_map.get(&normalize_header_name(&aliases.id_field)).copied();
    let risk = header_map.get(&normalize_header_name(&aliases.risk_field)).copied();

    let modeled = [Some(ethnicity), Some(race), Some(sex), id, risk];
    let rest = present
        .iter()
        .enumerate()
        .filter(|(idx, name)| !modeled.contains(&Some(*idx)) && header_map.get(*name) == Some(idx))
        .map(|(idx, name)| (name.clone(), idx))
        .collect();

    Ok(Columns {
        ethnicity,
        race,
        sex,
        id,
        risk,
        rest,
    })
}

fn build_applicant(
    row: &RawRow,
    columns: &Columns,
    id_field: &str,
    risk_field: &str,
) -> Result<Applicant, DroppedRow> {
    let id = match columns.id {
        Some(col) => row.cell(col).map(str::to_string).ok_or_else(|| DroppedRow {
            line: row.line,
            id: None,
            reason: format!("missing `{id_field}` value"),
        })?,
        // Synthesized ids follow input order: 1..=N, counting every record.
        None => (row.record + 1).to_string(),
    };

    let risk_ratio = match columns.risk {
        Some(col) => {
            let raw = row.cell(col).ok_or_else(|| DroppedRow {
                line: row.line,
                id: Some(id.clone()),
                reason: format!("missing `{risk_field}` value"),
            })?;
            let value = parse_finite(raw).ok_or_else(|| DroppedRow {
                line: row.line,
                id: Some(id.clone()),
                reason: format!("non-numeric `{risk_field}` value '{raw}'"),
            })?;
            Some(value)
        }
        None => None,
    };

    let text = |col: usize| row.cell(col).unwrap_or_default().to_string();
    let ethnicity_raw = text(columns.ethnicity);
    let race_raw = text(columns.race);
    let sex_raw = text(columns.sex);

    let extra = columns
        .rest
        .iter()
        .filter_map(|(name, col)| row.cell(*col).map(|v| (name.clone(), v.to_string())))
        .collect();

    Ok(Applicant {
        id,
        id_field: id_field.to_string(),
        risk_field: risk_field.to_string(),
        risk_ratio,
        cohort_race: cohort_race(&race_raw, &ethnicity_raw),
        cohort_sex: cohort_sex(&sex_raw),
        race_raw,
        ethnicity_raw,
        sex_raw,
        extra,
    })
}
