//! Linear-interpolation quantiles (the `linear` method of NumPy/Pandas).

/// Sort a copy of `values`, dropping NaN.
pub fn sorted_present(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Quantile `p` in `[0, 1]` of already sorted data.
///
/// The position is `h = p * (n - 1)`; the result interpolates between the
/// order statistics at `floor(h)` and `ceil(h)`. Returns `None` for empty
/// input.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let h = p.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let weight = h - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * weight)
}

/// Quantile `p` of unsorted data; NaN values are ignored.
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    quantile_sorted(&sorted_present(values), p)
}
