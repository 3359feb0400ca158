//! Order statistics.
//!
//! The threshold engine and the income-quartile audit both need the
//! "linear" percentile definition: for a sorted sample `v[0..n]` and fraction
//! `q ∈ [0, 1]`,
//!
//! ```text
//! h = q * (n - 1)
//! P(q) = v[floor(h)] + (h - floor(h)) * (v[floor(h) + 1] - v[floor(h)])
//! ```
//!
//! `q = 0` returns the minimum, `q = 1` the maximum.

/// Sort a copy of `values` ascending using IEEE total order.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Linear-interpolation percentile of an ascending slice.
///
/// Returns `None` for an empty slice or a fraction outside `[0, 1]`.
pub fn percentile_linear(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let last = sorted.len() - 1;
    let h = q * last as f64;
    let lo = (h.floor() as usize).min(last);
    let hi = (lo + 1).min(last);
    let t = h - lo as f64;
    Some(lerp(sorted[lo], sorted[hi], t))
}

// Evaluated from the nearer endpoint so that `t = 0` and `t = 1` reproduce the
// order statistics exactly (ties at the cutoff must compare equal).
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let diff = b - a;
    if t >= 0.5 {
        b - diff * (1.0 - t)
    } else {
        a + diff * t
    }
}
