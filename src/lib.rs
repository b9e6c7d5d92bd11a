//! arewefastyet - macro benchmark comparison service for Vitess
//!
//! This library compares repeated benchmark runs of two commits: per-metric
//! medians with distribution-free confidence intervals, Mann-Whitney U
//! significance tests, daily summaries over a time window, and the JSON API
//! the dashboard reads.

pub mod cache;
pub mod cli;
pub mod compare;
pub mod config;
pub mod daily;
pub mod error;
pub mod metric;
pub mod report;
pub mod run;
pub mod server;
pub mod stats;
pub mod status;
pub mod store;
pub mod workload;

pub use compare::{CompareResult, ComparedMetric, ComparisonEngine};
pub use config::Config;
pub use error::{CompareError, Result};
pub use workload::Workload;
