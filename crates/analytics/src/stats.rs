//! Small numeric helpers over `f64` samples.
//!
//! Every function returns `None` instead of `NaN` when the statistic is undefined
//! for the given input.

/// Deviations at or below this are treated as zero.
pub const MIN_DEVIATION: f64 = 1e-12;

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(xs: &[f64]) -> Option<f64> {
    let m = mean(xs)?;
    let variance = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / xs.len() as f64;
    Some(variance.sqrt())
}

/// Root mean square of the negative part of each sample.
pub fn downside_deviation(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let sum_sq: f64 = xs.iter().map(|x| x.min(0.0).powi(2)).sum();
    Some((sum_sq / xs.len() as f64).sqrt())
}

/// Percentile of an ascending-sorted slice using linear interpolation between
/// the order statistics at rank `p * (n - 1)`.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Pearson correlation of two equally long samples, clamped to [-1, 1].
///
/// `None` when fewer than two pairs are supplied or either side has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom <= MIN_DEVIATION * MIN_DEVIATION || !denom.is_finite() {
        return None;
    }
    Some((sxy / denom).clamp(-1.0, 1.0))
}

/// Replaces a non-finite value with `fallback`.
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}
