//! Per-cohort statistics.
//!
//! The statistics table is a projection of the engine output plus cohort
//! membership; it never recomputes thresholds. A row's approved count is the
//! number of members whose recorded decision is `approved`.

use serde::{Serialize, Serializer};

use crate::domain::Cohorts;
use crate::engine::thresholds::ThresholdOutcome;

/// One row of the statistics table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortStats {
    pub cohort: String,
    pub applicants: usize,
    /// Risk cutoff; `-inf` for an empty cohort (serialized as `null`).
    #[serde(serialize_with = "finite_or_null")]
    pub threshold: f64,
    pub approved: usize,
    /// Realized approval rate in percent (0 for an empty cohort).
    pub rate_pct: f64,
}

impl CohortStats {
    pub fn is_empty(&self) -> bool {
        self.applicants == 0
    }
}

/// Build the statistics table, sorted by cohort key.
pub fn summarize(cohorts: &Cohorts, outcome: &ThresholdOutcome, id_field: &str) -> Vec<CohortStats> {
    cohorts
        .iter()
        .map(|(key, members)| {
            let applicants = members.len();
            let approved = members
                .iter()
                .filter_map(|m| m.id_value(id_field))
                .filter(|id| outcome.decisions.get(*id).is_some_and(|d| d.is_approved()))
                .count();
            let rate_pct = if applicants == 0 {
                0.0
            } else {
                approved as f64 / applicants as f64 * 100.0
            };
            CohortStats {
                cohort: key.clone(),
                applicants,
                threshold: outcome.thresholds.get(key).copied().unwrap_or(f64::NEG_INFINITY),
                approved,
                rate_pct,
            }
        })
        .collect()
}

/// Ratio of the lowest to the highest realized approval rate over non-empty
/// cohorts. `None` when there is nothing to compare or the highest rate is 0.
pub fn parity_ratio(stats: &[CohortStats]) -> Option<f64> {
    let rates: Vec<f64> = stats.iter().filter(|s| !s.is_empty()).map(|s| s.rate_pct).collect();
    let max = rates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = rates.iter().copied().fold(f64::INFINITY, f64::min);
    if rates.is_empty() || max <= 0.0 {
        return None;
    }
    Some(min / max)
}

pub(crate) fn finite_or_null<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::{Applicant, DEFAULT_ID_FIELD, DEFAULT_RISK_FIELD};
    use crate::engine::compute_thresholds;

    fn member(id: &str, risk: f64) -> Applicant {
        Applicant {
            id: id.to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            risk_field: DEFAULT_RISK_FIELD.to_string(),
            risk_ratio: Some(risk),
            race_raw: "White".to_string(),
            ethnicity_raw: String::new(),
            sex_raw: "Male".to_string(),
            cohort_race: "White".to_string(),
            cohort_sex: "Male".to_string(),
            extra: BTreeMap::new(),
        }
    }

    fn fixture() -> (Cohorts, ThresholdOutcome) {
        let mut cohorts = Cohorts::new();
        cohorts.insert(
            "White Male".to_string(),
            vec![member("1", 10.0), member("2", 20.0), member("3", 30.0), member("4", 40.0)],
        );
        cohorts.insert("Asian Female".to_string(), Vec::new());
        let outcome = compute_thresholds(&cohorts, 0.5, DEFAULT_RISK_FIELD, DEFAULT_ID_FIELD).unwrap();
        (cohorts, outcome)
    }

    #[test]
    fn rows_report_counts_and_rates() {
        let (cohorts, outcome) = fixture();
        let stats = summarize(&cohorts, &outcome, DEFAULT_ID_FIELD);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].cohort, "Asian Female");
        assert_eq!(stats[0].applicants, 0);
        assert_eq!(stats[0].approved, 0);
        assert_eq!(stats[0].rate_pct, 0.0);
        assert_eq!(stats[0].threshold, f64::NEG_INFINITY);

        assert_eq!(stats[1].cohort, "White Male");
        assert_eq!(stats[1].applicants, 4);
        assert_eq!(stats[1].threshold, 25.0);
        assert_eq!(stats[1].approved, 2);
        assert_eq!(stats[1].rate_pct, 50.0);
    }

    #[test]
    fn empty_threshold_serializes_as_null() {
        let (cohorts, outcome) = fixture();
        let stats = summarize(&cohorts, &outcome, DEFAULT_ID_FIELD);
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json[0]["threshold"].is_null());
        assert_eq!(json[1]["threshold"], 25.0);
    }

    #[test]
    fn parity_ignores_empty_cohorts() {
        let row = |cohort: &str, applicants, rate_pct| CohortStats {
            cohort: cohort.to_string(),
            applicants,
            threshold: 0.0,
            approved: 0,
            rate_pct,
        };
        let stats = vec![row("a", 4, 50.0), row("b", 0, 0.0), row("c", 5, 40.0)];
        assert_eq!(parity_ratio(&stats), Some(0.8));
        assert_eq!(parity_ratio(&[row("b", 0, 0.0)]), None);
        assert_eq!(parity_ratio(&[row("a", 3, 0.0)]), None);
    }
}
