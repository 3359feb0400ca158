//! Synthetic HMDA-shaped applicant sample generation.
//!
//! Rows carry the public HMDA demographic labels, an integer DTI drawn from a
//! race-dependent normal distribution, an outcome code and an income. A small
//! share of DTI cells hold the non-numeric sentinels HMDA publishes so the
//! normalizer's drop path gets exercised.

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{LogNormal, Normal};

use crate::domain::{COL_ETHNICITY, COL_RACE, COL_SEX, DEFAULT_RISK_FIELD, RawTable, SampleConfig};
use crate::error::AppError;

pub const SAMPLE_HEADERS: [&str; 6] = [
    COL_ETHNICITY,
    COL_RACE,
    COL_SEX,
    DEFAULT_RISK_FIELD,
    "action_taken",
    "income",
];

/// Probability that a DTI cell holds a sentinel instead of a number.
const SENTINEL_PROB: f64 = 0.03;
const DTI_SENTINELS: [&str; 3] = ["Exempt", "NA", ">60%"];

const DTI_MEAN: f64 = 36.0;
const DTI_SD: f64 = 8.0;
const DTI_MAX: f64 = 70.0;

/// (label, weight, DTI mean offset)
const RACES: [(&str, f64, f64); 7] = [
    ("White", 0.60, 0.0),
    ("Black or African American", 0.12, 3.0),
    ("Asian", 0.08, -1.5),
    ("American Indian or Alaska Native", 0.02, 2.0),
    ("Native Hawaiian or Other Pacific Islander", 0.01, 2.5),
    ("Race Not Available", 0.10, 1.0),
    ("Joint", 0.07, -2.0),
];

const ETHNICITIES: [(&str, f64); 4] = [
    ("Not Hispanic or Latino", 0.75),
    ("Hispanic or Latino", 0.15),
    ("Ethnicity Not Available", 0.08),
    ("Joint", 0.02),
];

const SEXES: [(&str, f64); 4] = [("Male", 0.45), ("Female", 0.30), ("Joint", 0.20), ("Sex Not Available", 0.05)];

/// Generate `config.count` rows from `config.seed`. Same seed, same table.
pub fn generate_sample(config: &SampleConfig) -> Result<RawTable, AppError> {
    if config.count == 0 {
        return Err(AppError::new(2, "Sample count must be > 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let dist_err = |e: String| AppError::new(4, format!("Sample distribution error: {e}"));

    let race_idx = WeightedIndex::new(RACES.iter().map(|r| r.1)).map_err(|e| dist_err(e.to_string()))?;
    let eth_idx = WeightedIndex::new(ETHNICITIES.iter().map(|e| e.1)).map_err(|e| dist_err(e.to_string()))?;
    let sex_idx = WeightedIndex::new(SEXES.iter().map(|s| s.1)).map_err(|e| dist_err(e.to_string()))?;
    let noise = Normal::new(0.0, DTI_SD).map_err(|e| dist_err(e.to_string()))?;
    let income = LogNormal::new(90.0_f64.ln(), 0.5).map_err(|e| dist_err(e.to_string()))?;

    let mut rows = Vec::with_capacity(config.count);
    for _ in 0..config.count {
        let (race, _, offset) = RACES[race_idx.sample(&mut rng)];
        let ethnicity = ETHNICITIES[eth_idx.sample(&mut rng)].0;
        let sex = SEXES[sex_idx.sample(&mut rng)].0;

        let dti = (DTI_MEAN + offset + noise.sample(&mut rng)).clamp(0.0, DTI_MAX).round();
        let sentinel = rng.r#gen::<f64>() < SENTINEL_PROB;
        let dti_cell = if sentinel {
            DTI_SENTINELS[rng.gen_range(0..DTI_SENTINELS.len())].to_string()
        } else {
            format!("{dti:.0}")
        };

        let p_approve = if sentinel { 0.5 } else { approval_probability(dti) };
        let action = if rng.r#gen::<f64>() < p_approve { "1" } else { "3" };
        let income_k = income.sample(&mut rng).round().max(1.0);

        rows.push(vec![
            ethnicity.to_string(),
            race.to_string(),
            sex.to_string(),
            dti_cell,
            action.to_string(),
            format!("{income_k:.0}"),
        ]);
    }

    Ok(RawTable::from_rows(SAMPLE_HEADERS, rows))
}

/// Historical approval odds fall off linearly with DTI.
fn approval_probability(dti: f64) -> f64 {
    (0.95 - (dti - 20.0) * 0.015).clamp(0.05, 0.95)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(count: usize, seed: u64) -> SampleConfig {
        SampleConfig {
            count,
            seed,
            out: PathBuf::from("unused.csv"),
        }
    }

    #[test]
    fn same_seed_same_table() {
        let a = generate_sample(&config(200, 7)).unwrap();
        let b = generate_sample(&config(200, 7)).unwrap();
        assert_eq!(a, b);

        let c = generate_sample(&config(200, 8)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn rows_have_hmda_shape() {
        let t = generate_sample(&config(500, 1)).unwrap();
        assert_eq!(t.headers, SAMPLE_HEADERS);
        assert_eq!(t.len(), 500);
        assert_eq!(t.rows[0].line, 2);

        for row in &t.rows {
            assert_eq!(row.cells.len(), SAMPLE_HEADERS.len());
            assert!(row.cells[4] == "1" || row.cells[4] == "3");
            let dti = &row.cells[3];
            if let Ok(v) = dti.parse::<f64>() {
                assert!((0.0..=DTI_MAX).contains(&v));
            } else {
                assert!(DTI_SENTINELS.contains(&dti.as_str()), "unexpected DTI cell {dti}");
            }
        }
    }

    #[test]
    fn sentinels_are_rare_but_present() {
        let t = generate_sample(&config(5000, 42)).unwrap();
        let sentinels = t.rows.iter().filter(|r| r.cells[3].parse::<f64>().is_err()).count();
        assert!(sentinels > 50 && sentinels < 300, "sentinels={sentinels}");
    }

    #[test]
    fn zero_count_is_exit_code_2() {
        let err = generate_sample(&config(0, 1)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn approval_probability_is_bounded() {
        assert_eq!(approval_probability(0.0), 0.95);
        assert!((approval_probability(70.0) - 0.2).abs() < 1e-9);
        assert!(approval_probability(20.0) <= 0.95);
    }
}
