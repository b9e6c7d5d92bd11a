// Store backed by a remote results API
//
// Endpoints (all GET, JSON):
//   {base}/runs?git_ref=..&workload=..
//   {base}/runs?source=..&workload=..&since=<RFC 3339>
//   {base}/executions
//   {base}/vitess/refs
//
// A 404 maps to NotFound. Transport failures, timeouts and every other
// non-2xx answer map to UpstreamUnavailable. Nothing is retried here.
//
// The client is blocking: callers on an async runtime must go through
// spawn_blocking, and the store must be created and dropped outside of it.

use crate::error::{CompareError, Result};
use crate::run::{Execution, Run, VitessRefs};
use crate::store::BenchmarkStore;
use crate::workload::Workload;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the upstream results API
#[derive(Debug, Clone)]
pub struct UpstreamStore {
    client: Client,
    base_url: String,
}

impl UpstreamStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompareError::upstream(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, ?query, "upstream request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| CompareError::upstream(format!("GET {}: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CompareError::not_found(format!("GET {}: {}", url, status)));
        }
        if !status.is_success() {
            // The caller's request was valid; the upstream failed to serve it.
            return Err(CompareError::upstream(format!("GET {}: {}", url, status)));
        }

        let body = response
            .text()
            .map_err(|e| CompareError::upstream(format!("GET {}: {}", url, e)))?;
        Ok(serde_json::from_str(&body)?)
    }

    // A 404 on a runs query means no runs, which the engine reports itself.
    fn get_runs(&self, query: &[(&str, String)]) -> Result<Vec<Run>> {
        match self.get_json("/runs", query) {
            Err(CompareError::NotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }
}

impl BenchmarkStore for UpstreamStore {
    fn runs_for(&self, git_ref: &str, workload: Workload) -> Result<Vec<Run>> {
        self.get_runs(&[
            ("git_ref", git_ref.to_string()),
            ("workload", workload.to_string()),
        ])
    }

    fn runs_since(
        &self,
        source: &str,
        workload: Workload,
        since: DateTime<Utc>,
    ) -> Result<Vec<Run>> {
        self.get_runs(&[
            ("source", source.to_string()),
            ("workload", workload.to_string()),
            ("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ])
    }

    fn executions(&self) -> Result<Vec<Execution>> {
        self.get_json("/executions", &[])
    }

    fn refs(&self) -> Result<VitessRefs> {
        self.get_json("/vitess/refs", &[])
    }
}
