// Per-sample summary: median, order-statistic interval and relative range
//
// The interval [x(k), x(n-k+1)] around the median covers the true median with
// probability 1 - 2 * P(B <= k - 1), B ~ Binomial(n, 0.5). The narrowest k
// that still reaches the requested level is used. Below a handful of samples
// no k reaches it and the interval is unbounded.

use serde::{Deserialize, Serialize};
use statrs::distribution::{Binomial, DiscreteCDF};

/// Relative spread of a summary, as rendered by the dashboard (`±value%`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Range {
    /// Interval is unbounded (too few samples, or zero center with spread)
    pub infinite: bool,
    /// Spread cannot be expressed (missing data, undersized sample, sign change)
    pub unknown: bool,
    /// Half-width of the interval in percent of the center
    pub value: f64,
}

impl Range {
    pub fn bounded(value: f64) -> Self {
        Range {
            infinite: false,
            unknown: false,
            value,
        }
    }

    pub fn infinite() -> Self {
        Range {
            infinite: true,
            unknown: false,
            value: 0.0,
        }
    }

    pub fn unknown() -> Self {
        Range {
            infinite: false,
            unknown: true,
            value: 0.0,
        }
    }
}

/// Summary of one metric over the runs of one commit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Sample median
    pub center: f64,
    /// Half-width of the confidence interval around the median
    pub confidence: f64,
    pub range: Range,
}

impl MetricSummary {
    /// Summary of an empty sample
    pub fn empty() -> Self {
        MetricSummary {
            center: 0.0,
            confidence: 0.0,
            range: Range::unknown(),
        }
    }
}

/// Confidence interval on the median
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MedianInterval {
    pub lo: f64,
    pub hi: f64,
    /// Coverage actually achieved (at least the requested level)
    pub level: f64,
}

/// Sample median, `0.0` for an empty sample
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    median_of_sorted(&sorted)
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[middle]
    } else {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    }
}

/// Distribution-free confidence interval on the median of `sorted`
///
/// `sorted` must be in ascending order. Returns `None` when the sample is too
/// small for any order-statistic interval to reach `confidence`.
pub fn median_interval(sorted: &[f64], confidence: f64) -> Option<MedianInterval> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let binomial = Binomial::new(0.5, n as u64).ok()?;

    let mut best = None;
    // k is the 1-based rank of the lower bound.
    for k in 1..=n.div_ceil(2) {
        let level = 1.0 - 2.0 * binomial.cdf((k - 1) as u64);
        if level < confidence {
            break;
        }
        best = Some(MedianInterval {
            lo: sorted[k - 1],
            hi: sorted[n - k],
            level,
        });
    }
    best
}

/// Relative half-width of `[lo, hi]` around `center`, in percent
///
/// A zero center has no relative spread to speak of: the range is zero only
/// when every value in `sorted` is zero, unbounded otherwise.
fn relative_range(sorted: &[f64], center: f64, lo: f64, hi: f64) -> Range {
    if center == 0.0 {
        if sorted.iter().all(|&v| v == 0.0) {
            return Range::bounded(0.0);
        }
        return Range::infinite();
    }
    let negative = center < 0.0;
    if (lo < 0.0) != negative || (hi < 0.0) != negative {
        return Range::unknown();
    }
    let below = (1.0 - lo / center).abs();
    let above = (hi / center - 1.0).abs();
    Range::bounded(100.0 * below.max(above))
}

/// Summarize a sample: median center, interval half-width and relative range
///
/// Samples smaller than `min_sample_size` get `range.unknown`; samples too
/// small to reach `confidence` get `range.infinite`.
pub fn summarize(values: &[f64], confidence: f64, min_sample_size: usize) -> MetricSummary {
    if values.is_empty() {
        return MetricSummary::empty();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let center = median_of_sorted(&sorted);

    if sorted.len() < min_sample_size {
        return MetricSummary {
            center,
            confidence: 0.0,
            range: Range::unknown(),
        };
    }

    match median_interval(&sorted, confidence) {
        Some(interval) => MetricSummary {
            center,
            confidence: (interval.hi - interval.lo) / 2.0,
            range: relative_range(&sorted, center, interval.lo, interval.hi),
        },
        None => MetricSummary {
            center,
            confidence: 0.0,
            range: Range::infinite(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_length() {
        assert_eq!(median(&[9.0, 1.0, 5.0, 3.0, 7.0]), 5.0);
    }

    #[test]
    fn test_median_even_length() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_median_empty() {
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_interval_ten_samples() {
        let sorted: Vec<f64> = (1..=10).map(f64::from).collect();
        let interval = median_interval(&sorted, 0.95).unwrap();
        // P(B <= 1) = 11/1024 for n = 10, so [x(2), x(9)] covers ~97.9%.
        assert_eq!(interval.lo, 2.0);
        assert_eq!(interval.hi, 9.0);
        assert!((interval.level - (1.0 - 22.0 / 1024.0)).abs() < 1e-9);
    }

    #[test]
    fn test_interval_five_samples_unreachable() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        // Best achievable coverage is 1 - 2/32 = 93.75%.
        assert!(median_interval(&sorted, 0.95).is_none());
        let interval = median_interval(&sorted, 0.9).unwrap();
        assert_eq!((interval.lo, interval.hi), (1.0, 5.0));
    }

    #[test]
    fn test_relative_range_zero_center() {
        assert_eq!(relative_range(&[0.0, 0.0, 0.0], 0.0, 0.0, 0.0), Range::bounded(0.0));
        assert!(relative_range(&[0.0, 0.0, 1.0], 0.0, 0.0, 1.0).infinite);
        // Interval ends at zero, one non-zero value outside them
        assert!(relative_range(&[0.0, 0.0, 0.0, 0.0, 3.0], 0.0, 0.0, 0.0).infinite);
    }

    #[test]
    fn test_relative_range_sign_change() {
        assert!(relative_range(&[-1.0, 1.0, 2.0], 1.0, -1.0, 2.0).unknown);
    }

    #[test]
    fn test_relative_range_percent() {
        let range = relative_range(&[95.0, 100.0, 108.0], 100.0, 95.0, 108.0);
        assert!(!range.infinite && !range.unknown);
        assert!((range.value - 8.0).abs() < 1e-9);
    }
}
