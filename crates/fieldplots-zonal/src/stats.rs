//! Scalar statistics over pixel samples.
//!
//! All functions return `None` for empty input. Standard deviations are
//! population (`ddof = 0`) values and percentiles interpolate linearly
//! between order statistics.

use serde::{Deserialize, Serialize};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// `q`-th percentile (`0..=100`) of ascending `sorted` values.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 || !(0.0..=100.0).contains(&q) {
        return None;
    }
    let rank = q / 100.0 * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Fixed-range histogram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub counts: Vec<u64>,
    /// `counts.len() + 1` edges.
    pub bin_edges: Vec<f64>,
}

/// Histogram of `values` over `bins` equal bins spanning `range`.
///
/// Values outside the range are ignored; the last bin includes its upper
/// edge.
pub fn histogram(values: &[f64], bins: usize, range: (f64, f64)) -> Histogram {
    let (lo, hi) = range;
    let bins = bins.max(1);
    let width = (hi - lo) / bins as f64;
    let bin_edges = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0u64; bins];
    if width > 0.0 {
        for &v in values {
            if !(lo..=hi).contains(&v) {
                continue;
            }
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
    }
    Histogram { counts, bin_edges }
}

/// Circular mean and standard deviation of angles in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircularStats {
    /// In `[0, 360)`.
    pub mean: f64,
    pub std: f64,
}

pub fn circular_stats(degrees: &[f64]) -> Option<CircularStats> {
    if degrees.is_empty() {
        return None;
    }
    let (mut s, mut c) = (0.0, 0.0);
    for d in degrees {
        let r = d.to_radians();
        s += r.sin();
        c += r.cos();
    }
    let n = degrees.len() as f64;
    let (s, c) = (s / n, c / n);
    let mean = s.atan2(c).to_degrees().rem_euclid(360.0);
    // Resultant length can exceed 1 by rounding.
    let r = s.hypot(c).min(1.0);
    let std = if r > 0.0 {
        (-2.0 * r.ln()).sqrt().to_degrees()
    } else {
        f64::INFINITY
    };
    Some(CircularStats {
        mean: if mean >= 360.0 { 0.0 } else { mean },
        std,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_and_population_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&v).expect("mean"), 5.0);
        assert_relative_eq!(std_dev(&v).expect("std"), 2.0);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn percentiles_interpolate_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile_sorted(&v, 0.0).expect("p0"), 1.0);
        assert_relative_eq!(percentile_sorted(&v, 25.0).expect("p25"), 1.75);
        assert_relative_eq!(percentile_sorted(&v, 50.0).expect("p50"), 2.5);
        assert_relative_eq!(percentile_sorted(&v, 90.0).expect("p90"), 3.7, epsilon = 1e-12);
        assert_relative_eq!(percentile_sorted(&v, 100.0).expect("p100"), 4.0);
        assert_eq!(percentile_sorted(&v, 101.0), None);
    }

    #[test]
    fn histogram_counts_and_edges() {
        let h = histogram(&[0.0, 1.0, 5.0, 9.9, 10.0, 11.0, -1.0], 5, (0.0, 10.0));
        assert_eq!(h.counts, vec![2, 0, 1, 0, 2]);
        assert_eq!(h.bin_edges, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn circular_mean_wraps_around_zero() {
        let c = circular_stats(&[0.0, 359.0]).expect("stats");
        let dist = (c.mean - 359.5).abs().min(c.mean.abs());
        assert!(dist < 1e-9, "mean {}", c.mean);
        assert!(c.std < 1.0);
    }

    #[test]
    fn circular_std_of_identical_angles_is_zero() {
        let c = circular_stats(&[120.0; 5]).expect("stats");
        assert_relative_eq!(c.mean, 120.0, epsilon = 1e-9);
        assert_relative_eq!(c.std, 0.0, epsilon = 1e-5);
    }
}
