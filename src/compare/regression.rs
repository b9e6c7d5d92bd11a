// Regression reasons for a comparison
//
// Only statistically significant changes are reported. Throughput and
// latency tolerate more run-to-run noise than CPU time, so they use a wider
// threshold.

use crate::compare::ComparedMetric;
use crate::metric::{Component, Metric, MetricSet};

/// Minimum QPS/TPS drop or latency increase reported, in percent
pub const THROUGHPUT_THRESHOLD: f64 = 10.0;

/// Minimum CPU time increase reported, in percent
pub const CPU_TIME_THRESHOLD: f64 = 5.0;

const CHECKS: [(Metric, &str, f64); 6] = [
    (Metric::TotalComponentsCpuTime, "Total CPU time", CPU_TIME_THRESHOLD),
    (Metric::ComponentCpuTime(Component::Vtgate), "vtgate CPU time", CPU_TIME_THRESHOLD),
    (Metric::ComponentCpuTime(Component::Vttablet), "vttablet CPU time", CPU_TIME_THRESHOLD),
    (Metric::Tps, "TPS", THROUGHPUT_THRESHOLD),
    (Metric::TotalQps, "QPS", THROUGHPUT_THRESHOLD),
    (Metric::Latency, "Latency", THROUGHPUT_THRESHOLD),
];

/// Significant regressions in `metrics`, e.g. `- TPS decreased by 50.00%`
pub fn regression_reasons(metrics: &MetricSet<ComparedMetric>) -> Vec<String> {
    CHECKS
        .iter()
        .filter_map(|&(metric, label, threshold)| {
            let compared = metrics.get(metric);
            if compared.insignificant {
                return None;
            }
            if metric.higher_is_better() {
                (-compared.delta >= threshold)
                    .then(|| format!("- {} decreased by {:.2}%", label, -compared.delta))
            } else {
                (compared.delta >= threshold)
                    .then(|| format!("- {} increased by {:.2}%", label, compared.delta))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::MetricSummary;

    fn unchanged() -> ComparedMetric {
        ComparedMetric {
            insignificant: true,
            delta: 0.0,
            p: 1.0,
            n1: 10,
            n2: 10,
            old: MetricSummary::empty(),
            new: MetricSummary::empty(),
        }
    }

    fn changed(delta: f64) -> ComparedMetric {
        ComparedMetric {
            insignificant: false,
            delta,
            p: 0.001,
            ..unchanged()
        }
    }

    fn set_with(changes: &[(Metric, ComparedMetric)]) -> MetricSet<ComparedMetric> {
        MetricSet::from_fn(|m| {
            changes
                .iter()
                .find(|(metric, _)| *metric == m)
                .map(|(_, c)| *c)
                .unwrap_or_else(unchanged)
        })
    }

    #[test]
    fn test_no_regression() {
        assert!(regression_reasons(&set_with(&[])).is_empty());
    }

    #[test]
    fn test_total_cpu_time_increase() {
        let set = set_with(&[(Metric::TotalComponentsCpuTime, changed(5.0))]);
        assert_eq!(regression_reasons(&set), vec!["- Total CPU time increased by 5.00%"]);
    }

    #[test]
    fn test_cpu_time_below_threshold() {
        let set = set_with(&[(Metric::ComponentCpuTime(Component::Vtgate), changed(4.99))]);
        assert!(regression_reasons(&set).is_empty());
    }

    #[test]
    fn test_both_components_increase() {
        let set = set_with(&[
            (Metric::ComponentCpuTime(Component::Vtgate), changed(5.0)),
            (Metric::ComponentCpuTime(Component::Vttablet), changed(35.0)),
        ]);
        assert_eq!(
            regression_reasons(&set),
            vec![
                "- vtgate CPU time increased by 5.00%",
                "- vttablet CPU time increased by 35.00%",
            ]
        );
    }

    #[test]
    fn test_throughput_and_latency_ordering() {
        let set = set_with(&[
            (Metric::Latency, changed(10.0)),
            (Metric::Tps, changed(-32.5)),
            (Metric::TotalQps, changed(-27.7)),
        ]);
        assert_eq!(
            regression_reasons(&set),
            vec![
                "- TPS decreased by 32.50%",
                "- QPS decreased by 27.70%",
                "- Latency increased by 10.00%",
            ]
        );
    }

    #[test]
    fn test_improvement_is_not_regression() {
        let set = set_with(&[
            (Metric::Tps, changed(40.0)),
            (Metric::Latency, changed(-20.0)),
            (Metric::TotalComponentsCpuTime, changed(-15.0)),
        ]);
        assert!(regression_reasons(&set).is_empty());
    }

    #[test]
    fn test_insignificant_change_is_ignored() {
        let mut tps = changed(-50.0);
        tps.insignificant = true;
        assert!(regression_reasons(&set_with(&[(Metric::Tps, tps)])).is_empty());
    }
}
