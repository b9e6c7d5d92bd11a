// File-backed store
//
// The dataset is a single JSON document:
//
//   { "runs": [...], "executions": [...], "refs": {"branches": [...], "tags": [...]} }
//
// Only `runs` is required. The file is decoded into typed structs once, so a
// malformed document fails at load time with a Parse error instead of
// surfacing later as missing fields.

use crate::error::Result;
use crate::run::{Execution, Run, VitessRefs};
use crate::store::BenchmarkStore;
use crate::workload::Workload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything a results file holds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub runs: Vec<Run>,
    #[serde(default)]
    pub executions: Vec<Execution>,
    #[serde(default)]
    pub refs: VitessRefs,
}

impl Dataset {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }
}

/// In-memory store over a [`Dataset`]
#[derive(Debug, Clone, Default)]
pub struct JsonStore {
    dataset: Dataset,
}

impl JsonStore {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    /// Load and decode a dataset file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let dataset = Dataset::from_file(path.as_ref())?;
        tracing::info!(
            path = %path.as_ref().display(),
            runs = dataset.runs.len(),
            executions = dataset.executions.len(),
            "loaded results dataset"
        );
        Ok(Self::new(dataset))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

impl BenchmarkStore for JsonStore {
    fn runs_for(&self, git_ref: &str, workload: Workload) -> Result<Vec<Run>> {
        Ok(self
            .dataset
            .runs
            .iter()
            .filter(|run| run.git_ref == git_ref && run.workload == workload)
            .cloned()
            .collect())
    }

    fn runs_since(
        &self,
        source: &str,
        workload: Workload,
        since: DateTime<Utc>,
    ) -> Result<Vec<Run>> {
        Ok(self
            .dataset
            .runs
            .iter()
            .filter(|run| run.source == source && run.workload == workload)
            .filter(|run| run.created_at.is_some_and(|at| at >= since))
            .cloned()
            .collect())
    }

    fn executions(&self) -> Result<Vec<Execution>> {
        Ok(self.dataset.executions.clone())
    }

    fn refs(&self) -> Result<VitessRefs> {
        Ok(self.dataset.refs.clone())
    }
}
