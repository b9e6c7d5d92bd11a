//! Plain-text reports for the command line

use crate::compare::{CompareResult, ComparedMetric};
use crate::daily::MacroData;
use crate::stats::{MetricSummary, Range};
use crate::workload::Workload;
use std::fmt::Write;

fn format_range(range: &Range) -> String {
    if range.unknown {
        "±?".to_string()
    } else if range.infinite {
        "±∞".to_string()
    } else {
        format!("±{:.1}%", range.value)
    }
}

fn format_summary(summary: &MetricSummary) -> String {
    format!("{:.2} {}", summary.center, format_range(&summary.range))
}

fn verdict(compared: &ComparedMetric) -> &'static str {
    if compared.insignificant {
        "~"
    } else if compared.delta > 0.0 {
        "+"
    } else {
        "-"
    }
}

/// Side-by-side comparison of every metric, followed by regression reasons
pub fn compare_report(
    old_ref: &str,
    new_ref: &str,
    workload: Workload,
    result: &CompareResult,
) -> String {
    let mut report = String::new();

    let _ = writeln!(report, "{}: {} -> {}", workload, old_ref, new_ref);
    if result.missing_results {
        report.push_str("⚠️  MISSING RESULTS: one of the commits has no runs\n");
    }
    report.push('\n');

    let _ = writeln!(
        report,
        "{:<26} {:>22} {:>22} {:>9} {:>7} {}",
        "Metric", "Old", "New", "Delta", "p", ""
    );
    for (metric, compared) in result.metrics.iter() {
        let _ = writeln!(
            report,
            "{:<26} {:>22} {:>22} {:>8.2}% {:>7.3} {}",
            metric.label(),
            format_summary(&compared.old),
            format_summary(&compared.new),
            compared.delta,
            compared.p,
            verdict(compared)
        );
    }

    let reasons = result.regression_reasons();
    report.push('\n');
    if reasons.is_empty() {
        report.push_str("✅ NO REGRESSION DETECTED\n");
    } else {
        let _ = writeln!(report, "❌ REGRESSION DETECTED ({} reasons)", reasons.len());
        for reason in reasons {
            report.push_str(&reason);
            report.push('\n');
        }
    }
    report
}

/// One line per commit with its median total QPS, TPS and latency
pub fn daily_report(data: &[MacroData]) -> String {
    if data.is_empty() {
        return "No runs in the window\n".to_string();
    }
    let mut report = String::new();
    let _ = writeln!(
        report,
        "{:<18} {:<14} {:<20} {:>22} {:>22} {:>22}",
        "Workload", "Ref", "Date", "QPS Total", "TPS", "Latency"
    );
    for entry in data {
        let date = entry
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let short_ref: String = entry.git_ref.chars().take(12).collect();
        let _ = writeln!(
            report,
            "{:<18} {:<14} {:<20} {:>22} {:>22} {:>22}",
            entry.workload.as_str(),
            short_ref,
            date,
            format_summary(&entry.metrics.total_qps),
            format_summary(&entry.metrics.tps),
            format_summary(&entry.metrics.latency)
        );
    }
    report
}
