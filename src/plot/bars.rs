//! Horizontal ASCII bar chart of realized approval rates.
//!
//! Output is plain ASCII and fully deterministic (helpful for golden tests):
//! - one bar per cohort, in key order
//! - bar length is `rate / 100 * width`, rounded
//! - a `|` marker shows where the target rate falls on the scale

use crate::engine::CohortStats;

const MIN_WIDTH: usize = 10;

/// Render one bar per cohort, scaled so `width` characters = 100%.
pub fn render_rate_bars(stats: &[CohortStats], target_rate: f64, width: usize) -> String {
    let width = width.max(MIN_WIDTH);
    let label_width = stats.iter().map(|s| s.cohort.chars().count()).max().unwrap_or(0);
    let target_col = scale(target_rate * 100.0, width);

    let mut out = String::new();
    out.push_str(&format!(
        "Approval rate by cohort (0-100%, target {:.1}% at '|')\n",
        target_rate * 100.0
    ));

    for s in stats {
        let filled = scale(s.rate_pct, width);
        let mut bar: Vec<char> = (0..width).map(|i| if i < filled { '#' } else { ' ' }).collect();
        if target_col < width && bar[target_col] == ' ' {
            bar[target_col] = '|';
        }
        let bar: String = bar.into_iter().collect();
        out.push_str(&format!(
            "{:<label_width$} [{bar}] {:>5.1}%\n",
            s.cohort, s.rate_pct
        ));
    }

    out
}

fn scale(pct: f64, width: usize) -> usize {
    let u = (pct / 100.0).clamp(0.0, 1.0);
    (u * width as f64).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(cohort: &str, rate_pct: f64) -> CohortStats {
        CohortStats {
            cohort: cohort.to_string(),
            applicants: 4,
            threshold: 1.0,
            approved: 2,
            rate_pct,
        }
    }

    #[test]
    fn bars_golden_snapshot_small() {
        let stats = vec![stat("Asian Male", 50.0), stat("White Female", 100.0), stat("X", 0.0)];
        let txt = render_rate_bars(&stats, 0.5, 10);
        let expected = concat!(
            "Approval rate by cohort (0-100%, target 50.0% at '|')\n",
            "Asian Male   [#####|    ]  50.0%\n",
            "White Female [##########] 100.0%\n",
            "X            [     |    ]   0.0%\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn width_has_a_floor() {
        let txt = render_rate_bars(&[stat("A", 100.0)], 1.0, 2);
        assert!(txt.contains(&format!("[{}]", "#".repeat(MIN_WIDTH))));
    }
}
