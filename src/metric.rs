//! Tracked metrics and the per-metric container used by every report
//!
//! `MetricSet<T>` holds one `T` per [`Metric`] and serializes to the nested
//! JSON shape the dashboard reads (`components_cpu_time.vtgate`, ...). Both the
//! comparison report and the daily summary are built from it, so adding a
//! metric means touching this file only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Vitess component whose resource usage is tracked separately
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    Vtgate,
    Vttablet,
}

impl Component {
    pub const ALL: [Component; 2] = [Component::Vtgate, Component::Vttablet];

    /// Key used in run payloads and JSON reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Vtgate => "vtgate",
            Component::Vttablet => "vttablet",
        }
    }
}

/// Metric key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    TotalQps,
    ReadsQps,
    WritesQps,
    OtherQps,
    Tps,
    Latency,
    Errors,
    TotalComponentsCpuTime,
    ComponentCpuTime(Component),
    TotalComponentsMemStatsAllocBytes,
    ComponentMemStatsAllocBytes(Component),
}

impl Metric {
    /// Every tracked metric, in report order
    pub const ALL: [Metric; 13] = [
        Metric::TotalQps,
        Metric::ReadsQps,
        Metric::WritesQps,
        Metric::OtherQps,
        Metric::Tps,
        Metric::Latency,
        Metric::Errors,
        Metric::TotalComponentsCpuTime,
        Metric::ComponentCpuTime(Component::Vtgate),
        Metric::ComponentCpuTime(Component::Vttablet),
        Metric::TotalComponentsMemStatsAllocBytes,
        Metric::ComponentMemStatsAllocBytes(Component::Vtgate),
        Metric::ComponentMemStatsAllocBytes(Component::Vttablet),
    ];

    /// Dotted JSON path of the metric inside a report
    pub fn name(&self) -> &'static str {
        match self {
            Metric::TotalQps => "total_qps",
            Metric::ReadsQps => "reads_qps",
            Metric::WritesQps => "writes_qps",
            Metric::OtherQps => "other_qps",
            Metric::Tps => "tps",
            Metric::Latency => "latency",
            Metric::Errors => "errors",
            Metric::TotalComponentsCpuTime => "total_components_cpu_time",
            Metric::ComponentCpuTime(Component::Vtgate) => "components_cpu_time.vtgate",
            Metric::ComponentCpuTime(Component::Vttablet) => "components_cpu_time.vttablet",
            Metric::TotalComponentsMemStatsAllocBytes => "total_components_mem_stats_alloc_bytes",
            Metric::ComponentMemStatsAllocBytes(Component::Vtgate) => {
                "components_mem_stats_alloc_bytes.vtgate"
            }
            Metric::ComponentMemStatsAllocBytes(Component::Vttablet) => {
                "components_mem_stats_alloc_bytes.vttablet"
            }
        }
    }

    /// Human-readable label for text reports
    pub fn label(&self) -> String {
        match self {
            Metric::TotalQps => "QPS Total".to_string(),
            Metric::ReadsQps => "QPS Reads".to_string(),
            Metric::WritesQps => "QPS Writes".to_string(),
            Metric::OtherQps => "QPS Other".to_string(),
            Metric::Tps => "TPS".to_string(),
            Metric::Latency => "Latency".to_string(),
            Metric::Errors => "Errors".to_string(),
            Metric::TotalComponentsCpuTime => "Total CPU time".to_string(),
            Metric::ComponentCpuTime(c) => format!("{} CPU time", c.as_str()),
            Metric::TotalComponentsMemStatsAllocBytes => "Total allocated memory".to_string(),
            Metric::ComponentMemStatsAllocBytes(c) => format!("{} allocated memory", c.as_str()),
        }
    }

    /// Whether a larger value means better performance
    pub fn higher_is_better(&self) -> bool {
        matches!(
            self,
            Metric::TotalQps | Metric::ReadsQps | Metric::WritesQps | Metric::OtherQps | Metric::Tps
        )
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-component values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Components<T> {
    pub vtgate: T,
    pub vttablet: T,
}

impl<T> Components<T> {
    pub fn get(&self, component: Component) -> &T {
        match component {
            Component::Vtgate => &self.vtgate,
            Component::Vttablet => &self.vttablet,
        }
    }
}

/// One value per tracked metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSet<T> {
    pub total_qps: T,
    pub reads_qps: T,
    pub writes_qps: T,
    pub other_qps: T,
    pub tps: T,
    pub latency: T,
    pub errors: T,
    pub total_components_cpu_time: T,
    pub components_cpu_time: Components<T>,
    pub total_components_mem_stats_alloc_bytes: T,
    pub components_mem_stats_alloc_bytes: Components<T>,
}

impl<T> MetricSet<T> {
    /// Build a set by evaluating `f` once per metric, in [`Metric::ALL`] order
    pub fn from_fn<F: FnMut(Metric) -> T>(mut f: F) -> Self {
        MetricSet {
            total_qps: f(Metric::TotalQps),
            reads_qps: f(Metric::ReadsQps),
            writes_qps: f(Metric::WritesQps),
            other_qps: f(Metric::OtherQps),
            tps: f(Metric::Tps),
            latency: f(Metric::Latency),
            errors: f(Metric::Errors),
            total_components_cpu_time: f(Metric::TotalComponentsCpuTime),
            components_cpu_time: Components {
                vtgate: f(Metric::ComponentCpuTime(Component::Vtgate)),
                vttablet: f(Metric::ComponentCpuTime(Component::Vttablet)),
            },
            total_components_mem_stats_alloc_bytes: f(Metric::TotalComponentsMemStatsAllocBytes),
            components_mem_stats_alloc_bytes: Components {
                vtgate: f(Metric::ComponentMemStatsAllocBytes(Component::Vtgate)),
                vttablet: f(Metric::ComponentMemStatsAllocBytes(Component::Vttablet)),
            },
        }
    }

    pub fn get(&self, metric: Metric) -> &T {
        match metric {
            Metric::TotalQps => &self.total_qps,
            Metric::ReadsQps => &self.reads_qps,
            Metric::WritesQps => &self.writes_qps,
            Metric::OtherQps => &self.other_qps,
            Metric::Tps => &self.tps,
            Metric::Latency => &self.latency,
            Metric::Errors => &self.errors,
            Metric::TotalComponentsCpuTime => &self.total_components_cpu_time,
            Metric::ComponentCpuTime(c) => self.components_cpu_time.get(c),
            Metric::TotalComponentsMemStatsAllocBytes => {
                &self.total_components_mem_stats_alloc_bytes
            }
            Metric::ComponentMemStatsAllocBytes(c) => self.components_mem_stats_alloc_bytes.get(c),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, &T)> + '_ {
        Metric::ALL.iter().map(move |&m| (m, self.get(m)))
    }
}
