//! Recorded benchmark data: runs, executions and Vitess refs
//!
//! Runs are written by the benchmark executor and never modified here. Every
//! metric field is optional so a payload that lacks one is detected instead of
//! silently read as zero.

use crate::metric::{Component, Metric};
use crate::workload::Workload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Queries per second broken down by statement kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Qps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reads: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<f64>,
}

/// Raw sysbench-style output of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(default)]
    pub qps: Qps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnects: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<f64>,
}

/// Resource usage collected from the Vitess components during a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_components_cpu_time: Option<f64>,
    #[serde(default)]
    pub components_cpu_time: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_components_mem_stats_alloc_bytes: Option<f64>,
    #[serde(default)]
    pub components_mem_stats_alloc_bytes: BTreeMap<String, f64>,
}

/// One execution of a workload against one commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub id: u64,
    pub git_ref: String,
    pub workload: Workload,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_uuid: Option<String>,
    #[serde(default)]
    pub result: RunResult,
    #[serde(default)]
    pub metrics: ExecutionMetrics,
}

impl Run {
    /// Value of `metric` in this run, `None` when the payload lacks it
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::TotalQps => self.result.qps.total,
            Metric::ReadsQps => self.result.qps.reads,
            Metric::WritesQps => self.result.qps.writes,
            Metric::OtherQps => self.result.qps.other,
            Metric::Tps => self.result.tps,
            Metric::Latency => self.result.latency,
            Metric::Errors => self.result.errors,
            Metric::TotalComponentsCpuTime => self.metrics.total_components_cpu_time,
            Metric::ComponentCpuTime(c) => component(&self.metrics.components_cpu_time, c),
            Metric::TotalComponentsMemStatsAllocBytes => {
                self.metrics.total_components_mem_stats_alloc_bytes
            }
            Metric::ComponentMemStatsAllocBytes(c) => {
                component(&self.metrics.components_mem_stats_alloc_bytes, c)
            }
        }
    }
}

fn component(values: &BTreeMap<String, f64>, component: Component) -> Option<f64> {
    values.get(component.as_str()).copied()
}

/// Values of `metric` across `runs`
///
/// Runs that lack the metric contribute `0.0`; the returned flag reports
/// whether any substitution happened.
pub fn metric_samples(runs: &[Run], metric: Metric) -> (Vec<f64>, bool) {
    let mut missing = false;
    let samples = runs
        .iter()
        .map(|run| match run.metric(metric) {
            Some(v) if v.is_finite() => v,
            _ => {
                missing = true;
                0.0
            }
        })
        .collect();
    (samples, missing)
}

/// Lifecycle state of a benchmark execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Created,
    Started,
    Failed,
    Finished,
}

impl ExecutionStatus {
    /// Whether the execution is still queued or running
    pub fn is_pending(&self) -> bool {
        matches!(self, ExecutionStatus::Created | ExecutionStatus::Started)
    }
}

/// A benchmark execution as scheduled by the executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub uuid: String,
    pub git_ref: String,
    pub source: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    pub type_of: String,
    #[serde(default)]
    pub pull_nb: Option<u64>,
    #[serde(default)]
    pub golang_version: String,
    pub status: ExecutionStatus,
}

/// Semantic version of a Vitess release
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// A Vitess branch or tag and the commit it points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitessRef {
    pub name: String,
    pub commit_hash: String,
    #[serde(default)]
    pub version: Version,
    #[serde(default)]
    pub rc_number: u32,
}

/// Branches and tags offered for comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitessRefs {
    #[serde(default)]
    pub branches: Vec<VitessRef>,
    #[serde(default)]
    pub tags: Vec<VitessRef>,
}

impl VitessRefs {
    /// Commit hash of a branch or tag by name
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.branches
            .iter()
            .chain(self.tags.iter())
            .find(|r| r.name == name)
            .map(|r| r.commit_hash.as_str())
    }
}
