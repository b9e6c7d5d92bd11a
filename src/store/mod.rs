//! Read access to recorded benchmark data
//!
//! The comparison engine only needs runs for a ref and workload; the daily
//! summary needs a time window of runs for one source; the status endpoints
//! need executions and refs. [`BenchmarkStore`] covers exactly that, with two
//! implementations:
//!
//! - [`JsonStore`]: a dataset file loaded into memory
//! - [`UpstreamStore`]: a remote results API over HTTP

mod json_store;
mod upstream;

pub use json_store::{Dataset, JsonStore};
pub use upstream::UpstreamStore;

use crate::error::Result;
use crate::run::{Execution, Run, VitessRefs};
use crate::workload::Workload;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Source of runs, executions and refs
///
/// Implementations must be safe to share between request handlers.
pub trait BenchmarkStore: Send + Sync {
    /// Every run recorded for `git_ref` and `workload`
    fn runs_for(&self, git_ref: &str, workload: Workload) -> Result<Vec<Run>>;

    /// Runs of `workload` from `source` created at or after `since`
    fn runs_since(&self, source: &str, workload: Workload, since: DateTime<Utc>)
        -> Result<Vec<Run>>;

    /// All known executions, in no particular order
    fn executions(&self) -> Result<Vec<Execution>>;

    /// Branches and tags offered for comparison
    fn refs(&self) -> Result<VitessRefs>;
}

impl<S: BenchmarkStore + ?Sized> BenchmarkStore for Arc<S> {
    fn runs_for(&self, git_ref: &str, workload: Workload) -> Result<Vec<Run>> {
        (**self).runs_for(git_ref, workload)
    }

    fn runs_since(
        &self,
        source: &str,
        workload: Workload,
        since: DateTime<Utc>,
    ) -> Result<Vec<Run>> {
        (**self).runs_since(source, workload, since)
    }

    fn executions(&self) -> Result<Vec<Execution>> {
        (**self).executions()
    }

    fn refs(&self) -> Result<VitessRefs> {
        (**self).refs()
    }
}
