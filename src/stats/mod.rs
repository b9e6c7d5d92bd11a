// Statistics for benchmark comparison
//
// Benchmark hosts are noisy and repeated runs rarely look normally
// distributed, so nothing here assumes normality:
// - center: sample median
// - spread: distribution-free confidence interval on the median, built from
//   binomial order statistics
// - significance: two-sided Mann-Whitney U test (exact for small tie-free
//   samples, normal approximation with tie correction otherwise)
//
// Distributions come from statrs.

mod mann_whitney;
mod summary;

pub use mann_whitney::{mann_whitney_u, MannWhitney, EXACT_LIMIT};
pub use summary::{median, median_interval, summarize, MedianInterval, MetricSummary, Range};
