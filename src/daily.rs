//! Daily and historical summaries
//!
//! The same per-metric summary the comparison engine computes, applied to a
//! time window of runs from one source (nightly `cron` runs by default) and
//! grouped per commit. There is no delta and no significance test here; the
//! dashboard charts the centers over time.
//!
//! [`search`] applies the same summary to every workload of a single commit.

use crate::config::{DailyConfig, EngineConfig};
use crate::error::{CompareError, Result};
use crate::metric::MetricSet;
use crate::run::{metric_samples, Run};
use crate::stats::{summarize, MetricSummary};
use crate::store::BenchmarkStore;
use crate::workload::Workload;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Summary of every metric for one commit on one workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroData {
    pub workload: Workload,
    pub git_ref: String,
    /// Time of the commit's earliest run in the window
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub metrics: MetricSet<MetricSummary>,
}

/// One point of the daily QPS chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub created_at: Option<DateTime<Utc>>,
    pub qps_total: f64,
}

/// Daily QPS series of one workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub name: Workload,
    pub data: Vec<DailyPoint>,
}

/// Summaries of one commit, keyed by workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "Macros")]
    pub macros: BTreeMap<Workload, MacroData>,
}

/// Summarize `runs` per commit, ordered by each commit's earliest run
pub fn macro_data(runs: &[Run], workload: Workload, engine: &EngineConfig) -> Vec<MacroData> {
    let mut groups: HashMap<&str, (Option<DateTime<Utc>>, Vec<Run>)> = HashMap::new();
    for run in runs.iter().filter(|run| run.workload == workload) {
        let (earliest, group) = groups
            .entry(run.git_ref.as_str())
            .or_insert_with(|| (run.created_at, Vec::new()));
        if run.created_at < *earliest {
            *earliest = run.created_at;
        }
        group.push(run.clone());
    }

    let mut commits: Vec<_> = groups.into_iter().collect();
    commits.sort_by(|(ref_a, (at_a, _)), (ref_b, (at_b, _))| {
        at_a.cmp(at_b).then_with(|| ref_a.cmp(ref_b))
    });

    commits
        .into_iter()
        .map(|(git_ref, (created_at, group))| MacroData {
            workload,
            git_ref: git_ref.to_string(),
            created_at,
            metrics: MetricSet::from_fn(|metric| {
                let (samples, missing) = metric_samples(&group, metric);
                let mut summary =
                    summarize(&samples, engine.confidence_level, engine.min_sample_size);
                if missing {
                    summary.range.unknown = true;
                }
                summary
            }),
        })
        .collect()
}

/// Per-commit summaries of the last `daily.window_days` days, for each of
/// `workloads`
pub fn daily<S: BenchmarkStore + ?Sized>(
    store: &S,
    workloads: &[Workload],
    daily: &DailyConfig,
    engine: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<Vec<MacroData>> {
    let since = Duration::try_days(i64::from(daily.window_days))
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| {
            CompareError::invalid_input(format!(
                "daily window of {} days reaches past the supported date range",
                daily.window_days
            ))
        })?;
    let mut data = Vec::new();
    for &workload in workloads {
        let runs = store.runs_since(&daily.source, workload, since)?;
        tracing::debug!(%workload, runs = runs.len(), %since, "daily window");
        data.extend(macro_data(&runs, workload, engine));
    }
    Ok(data)
}

/// Summary of `commit` on every workload it has runs for
///
/// Workloads without runs are left out; a commit with no runs at all yields
/// an empty result, not an error.
pub fn search<S: BenchmarkStore + ?Sized>(
    store: &S,
    commit: &str,
    engine: &EngineConfig,
) -> Result<SearchResult> {
    let mut macros = BTreeMap::new();
    for workload in Workload::ALL {
        let runs = store.runs_for(commit, workload)?;
        if let Some(data) = macro_data(&runs, workload, engine).into_iter().next() {
            macros.insert(workload, data);
        }
    }
    tracing::debug!(commit, workloads = macros.len(), "search");
    Ok(SearchResult { macros })
}

/// Median total QPS per commit over the window, one series per workload
pub fn daily_summary<S: BenchmarkStore + ?Sized>(
    store: &S,
    workloads: &[Workload],
    daily_config: &DailyConfig,
    engine: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<Vec<DailySummary>> {
    let data = daily(store, workloads, daily_config, engine, now)?;
    Ok(workloads
        .iter()
        .map(|&workload| DailySummary {
            name: workload,
            data: data
                .iter()
                .filter(|d| d.workload == workload)
                .map(|d| DailyPoint {
                    created_at: d.created_at,
                    qps_total: d.metrics.total_qps.center,
                })
                .collect(),
        })
        .collect())
}
