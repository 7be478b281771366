//! Descriptive statistics over sample slices
//!
//! Empty input yields 0 rather than an error so callers stay branch-free.

/// Arithmetic mean, 0 for an empty slice
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Largest value, 0 for an empty slice
pub fn max(xs: &[f64]) -> f64 {
    xs.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Smallest value, 0 for an empty slice
pub fn min(xs: &[f64]) -> f64 {
    xs.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

/// Population standard deviation (divides by N), 0 for an empty slice
pub fn stddev(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    let variance = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64;
    variance.sqrt()
}

/// Standard deviation as a percentage of the mean.
///
/// The mean must be non-zero; an all-zero slice yields NaN.
pub fn coefficient_of_variation(xs: &[f64]) -> f64 {
    stddev(xs) / mean(xs) * 100.0
}

/// Steadiness on a 0-100 scale (`100 - cv`), 0 when undefined
pub fn stability_pct(xs: &[f64]) -> f64 {
    if xs.is_empty() || mean(xs) == 0.0 {
        return 0.0;
    }
    (100.0 - coefficient_of_variation(xs)).clamp(0.0, 100.0)
}

/// Spread between the highest and lowest value
pub fn voltage_drop(xs: &[f64]) -> f64 {
    max(xs) - min(xs)
}
