//! Execution queue and service statistics

use crate::run::{Execution, ExecutionStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;

/// Maximum number of executions returned by [`recent`]
pub const RECENT_LIMIT: usize = 1000;

/// Executions still waiting or running: started ones first, oldest first
pub fn queue(executions: &[Execution]) -> Vec<Execution> {
    let mut pending: Vec<Execution> = executions
        .iter()
        .filter(|e| e.status.is_pending())
        .cloned()
        .collect();
    pending.sort_by_key(|e| (e.status != ExecutionStatus::Started, e.started_at));
    pending
}

/// Finished and failed executions, most recent first, at most [`RECENT_LIMIT`]
pub fn recent(executions: &[Execution]) -> Vec<Execution> {
    let mut done: Vec<Execution> = executions
        .iter()
        .filter(|e| !e.status.is_pending())
        .cloned()
        .collect();
    done.sort_by_key(|e| Reverse(e.finished_at.or(e.started_at)));
    done.truncate(RECENT_LIMIT);
    done
}

/// Aggregate counters shown on the status page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusStats {
    pub total: usize,
    pub finished: usize,
    pub last_30_days: usize,
    /// Distinct git refs benchmarked
    pub commits: usize,
    /// Mean wall time of finished executions, whole minutes per execution
    pub avg_duration_minutes: f64,
}

pub fn stats(executions: &[Execution], now: DateTime<Utc>) -> StatusStats {
    let since = now - Duration::days(30);
    let commits: HashSet<&str> = executions.iter().map(|e| e.git_ref.as_str()).collect();

    let durations: Vec<i64> = executions
        .iter()
        .filter(|e| e.status == ExecutionStatus::Finished)
        .filter_map(|e| Some((e.finished_at? - e.started_at?).num_minutes()))
        .collect();
    let avg_duration_minutes = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<i64>() as f64 / durations.len() as f64
    };

    StatusStats {
        total: executions.len(),
        finished: executions
            .iter()
            .filter(|e| e.status == ExecutionStatus::Finished)
            .count(),
        last_30_days: executions
            .iter()
            .filter(|e| e.started_at.is_some_and(|at| at >= since))
            .count(),
        commits: commits.len(),
        avg_duration_minutes,
    }
}
