// Mann-Whitney U test (two-sided)
//
// Rank-based test of whether two samples come from the same distribution.
// No normality assumption, which suits throughput and latency figures from
// shared benchmark hosts.
//
// - tie-free samples with n1 + n2 <= EXACT_LIMIT: exact null distribution of U
// - otherwise: normal approximation with tie and continuity correction

use crate::error::{CompareError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Largest combined sample size for which the exact distribution is used
pub const EXACT_LIMIT: usize = 50;

/// Outcome of a Mann-Whitney U test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MannWhitney {
    /// U statistic of the first sample (pairs where x > y, ties count half)
    pub u: f64,
    /// Two-sided p-value, in [0, 1]
    pub p: f64,
    pub n1: usize,
    pub n2: usize,
    /// Whether `p` comes from the exact distribution
    pub exact: bool,
}

/// Average ranks of the pooled sample and the tie correction term Σ(t³ - t)
fn pooled_ranks(x: &[f64], y: &[f64]) -> (f64, f64) {
    let mut pooled: Vec<(f64, bool)> = x
        .iter()
        .map(|&v| (v, true))
        .chain(y.iter().map(|&v| (v, false)))
        .collect();
    pooled.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut rank_sum_x = 0.0;
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < pooled.len() {
        let mut j = i;
        while j + 1 < pooled.len() && pooled[j + 1].0 == pooled[i].0 {
            j += 1;
        }
        let avg_rank = ((i + 1) + (j + 1)) as f64 / 2.0;
        let group = &pooled[i..=j];
        rank_sum_x += avg_rank * group.iter().filter(|(_, in_x)| *in_x).count() as f64;

        let t = group.len() as f64;
        tie_term += t * t * t - t;
        i = j + 1;
    }
    (rank_sum_x, tie_term)
}

/// Null distribution of U for tie-free samples: `counts[u]` is the number of
/// orderings of n1 + n2 values that yield U = u
fn u_counts(n1: usize, n2: usize) -> Vec<f64> {
    // table[i][j] holds the distribution for sample sizes (i, j).
    let mut table: Vec<Vec<Vec<f64>>> = vec![vec![Vec::new(); n2 + 1]; n1 + 1];
    for i in 0..=n1 {
        for j in 0..=n2 {
            if i == 0 || j == 0 {
                table[i][j] = vec![1.0];
                continue;
            }
            let mut counts = vec![0.0; i * j + 1];
            // Largest pooled value from x: it beats all j values of y.
            for (u, &c) in table[i - 1][j].iter().enumerate() {
                counts[u + j] += c;
            }
            // Largest pooled value from y: adds nothing to U.
            for (u, &c) in table[i][j - 1].iter().enumerate() {
                counts[u] += c;
            }
            table[i][j] = counts;
        }
    }
    std::mem::take(&mut table[n1][n2])
}

fn exact_p(u: f64, n1: usize, n2: usize) -> f64 {
    let counts = u_counts(n1, n2);
    let total: f64 = counts.iter().sum();
    // U is an integer when there are no ties.
    let u = u.round() as usize;
    let lower: f64 = counts[..=u].iter().sum();
    let upper: f64 = counts[u..].iter().sum();
    (2.0 * lower.min(upper) / total).min(1.0)
}

fn standard_normal() -> Normal {
    Normal::new(0.0, 1.0).unwrap_or_else(|_| unreachable!("unit variance should be valid"))
}

fn approximate_p(u: f64, n1: usize, n2: usize, tie_term: f64) -> f64 {
    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let n = n1f + n2f;
    let mean_u = n1f * n2f / 2.0;
    let variance = n1f * n2f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if variance <= 0.0 {
        // Every pooled value is identical.
        return 1.0;
    }
    let z = ((u - mean_u).abs() - 0.5).max(0.0) / variance.sqrt();
    (2.0 * standard_normal().sf(z)).min(1.0)
}

/// Two-sided Mann-Whitney U test between `x` and `y`
///
/// # Errors
/// `InsufficientSamples` when either sample is empty.
///
/// # Example
/// ```
/// use arewefastyet::stats::mann_whitney_u;
///
/// let old = [100.0, 102.0, 98.0, 101.0, 99.0];
/// let new = [150.0, 148.0, 152.0, 149.0, 151.0];
/// let test = mann_whitney_u(&old, &new).unwrap();
/// assert!(test.exact);
/// assert!(test.p < 0.05);
/// ```
pub fn mann_whitney_u(x: &[f64], y: &[f64]) -> Result<MannWhitney> {
    let (n1, n2) = (x.len(), y.len());
    if n1 == 0 || n2 == 0 {
        return Err(CompareError::InsufficientSamples {
            needed: 1,
            old: n1,
            new: n2,
        });
    }

    let (rank_sum_x, tie_term) = pooled_ranks(x, y);
    let u = rank_sum_x - (n1 * (n1 + 1)) as f64 / 2.0;

    let exact = tie_term == 0.0 && n1 + n2 <= EXACT_LIMIT;
    let p = if exact {
        exact_p(u, n1, n2)
    } else {
        approximate_p(u, n1, n2, tie_term)
    };

    Ok(MannWhitney {
        u,
        p,
        n1,
        n2,
        exact,
    })
}
