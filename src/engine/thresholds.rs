//! Per-cohort percentile thresholds and per-applicant decisions.
//!
//! For each cohort with members:
//! - collect the members' risk values
//! - threshold = linear percentile of those values at the target rate
//! - approve every member whose risk is at or below the threshold
//!
//! Empty cohorts get a threshold of `-inf` and contribute no decisions.
//!
//! Cohorts never read each other's members, so they are evaluated in parallel
//! and merged afterwards in key order. The merge makes the output (and which
//! failing cohort gets reported) independent of scheduling.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{Applicant, Cohorts, Decision};
use crate::error::FairnessError;
use crate::math::{percentile_linear, sorted};

/// Engine output.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdOutcome {
    /// Applicant id -> decision, for every member of every non-empty cohort.
    pub decisions: BTreeMap<String, Decision>,
    /// Cohort key -> risk cutoff, for every cohort (empty ones included).
    pub thresholds: BTreeMap<String, f64>,
}

impl ThresholdOutcome {
    pub fn approved_count(&self) -> usize {
        self.decisions.values().filter(|d| d.is_approved()).count()
    }
}

/// Result for a single cohort before merging.
#[derive(Debug, Clone)]
struct CohortDecisions {
    threshold: f64,
    decisions: Vec<(String, Decision)>,
}

/// Reject approval rates outside `[0, 1]` (NaN included).
pub fn validate_rate(target_rate: f64) -> Result<(), FairnessError> {
    if (0.0..=1.0).contains(&target_rate) {
        Ok(())
    } else {
        Err(FairnessError::Config { rate: target_rate })
    }
}

/// Compute cohort thresholds and applicant decisions for `target_rate`.
///
/// `risk_field` and `id_field` name the columns holding the risk value and
/// the applicant identifier (see [`Applicant::risk_value`] and
/// [`Applicant::id_value`]).
pub fn compute_thresholds(
    cohorts: &Cohorts,
    target_rate: f64,
    risk_field: &str,
    id_field: &str,
) -> Result<ThresholdOutcome, FairnessError> {
    validate_rate(target_rate)?;

    let entries: Vec<(&String, &Vec<Applicant>)> = cohorts.iter().collect();
    let per_cohort: Vec<(&String, Result<CohortDecisions, FairnessError>)> = entries
        .par_iter()
        .map(|(key, members)| (*key, decide_cohort(key, members, target_rate, risk_field, id_field)))
        .collect();

    let mut decisions = BTreeMap::new();
    let mut thresholds = BTreeMap::new();

    for (key, result) in per_cohort {
        let cohort = result?;
        debug!(cohort = %key, threshold = cohort.threshold, members = cohort.decisions.len(), "cohort threshold");
        thresholds.insert(key.clone(), cohort.threshold);
        for (id, decision) in cohort.decisions {
            if decisions.insert(id.clone(), decision).is_some() {
                return Err(FairnessError::Data {
                    cohort: key.clone(),
                    detail: format!("duplicate applicant id `{id}`"),
                });
            }
        }
    }

    let outcome = ThresholdOutcome { decisions, thresholds };
    info!(
        cohorts = outcome.thresholds.len(),
        applicants = outcome.decisions.len(),
        approved = outcome.approved_count(),
        target_rate,
        "computed cohort thresholds"
    );
    Ok(outcome)
}

fn decide_cohort(
    key: &str,
    members: &[Applicant],
    target_rate: f64,
    risk_field: &str,
    id_field: &str,
) -> Result<CohortDecisions, FairnessError> {
    if members.is_empty() {
        return Ok(CohortDecisions {
            threshold: f64::NEG_INFINITY,
            decisions: Vec::new(),
        });
    }

    let data_error = |detail: String| FairnessError::Data {
        cohort: key.to_string(),
        detail,
    };

    let mut scored = Vec::with_capacity(members.len());
    for member in members {
        let id = member
            .id_value(id_field)
            .ok_or_else(|| data_error(format!("applicant without `{id_field}` field")))?;
        let risk = member
            .risk_value(risk_field)
            .map_err(|e| data_error(format!("applicant `{id}`: {e}")))?;
        scored.push((id, risk));
    }

    let values: Vec<f64> = scored.iter().map(|(_, risk)| *risk).collect();
    let threshold = percentile_linear(&sorted(&values), target_rate)
        .ok_or_else(|| data_error("could not compute percentile".to_string()))?;

    let decisions = scored
        .into_iter()
        .map(|(id, risk)| (id.to_string(), Decision::at_cutoff(risk, threshold)))
        .collect();

    Ok(CohortDecisions { threshold, decisions })
}
