// Macro benchmark comparison between two commits
//
// For every tracked metric, the runs of the old and new commit are summarized
// (median, order-statistic interval, relative range) and tested against each
// other with a two-sided Mann-Whitney U test. The result is the structure the
// dashboard's compare page renders.
//
// Failure semantics:
// - no runs on either side: NotFound
// - no runs on one side: `missing_results`, every metric insignificant
// - metric absent from a run: counted as 0, summary flagged `range.unknown`
// - fewer than `min_sample_size` runs: test skipped (p = 1), or
//   InsufficientSamples with `strict_samples`
//
// Branch and tag names are resolved to commit hashes through the store's
// refs listing before any run is read.

mod regression;

pub use regression::{regression_reasons, CPU_TIME_THRESHOLD, THROUGHPUT_THRESHOLD};

use crate::config::EngineConfig;
use crate::error::{CompareError, Result};
use crate::metric::MetricSet;
use crate::run::{metric_samples, Run, VitessRefs};
use crate::stats::{mann_whitney_u, summarize, MetricSummary};
use crate::store::BenchmarkStore;
use crate::workload::Workload;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Comparison of one metric between the old and new commit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparedMetric {
    /// `p > significance_level`
    pub insignificant: bool,
    /// Signed change of the center, in percent of the old center
    pub delta: f64,
    pub p: f64,
    /// Old sample size
    pub n1: usize,
    /// New sample size
    pub n2: usize,
    pub old: MetricSummary,
    pub new: MetricSummary,
}

/// Comparison of every tracked metric for one workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareResult {
    #[serde(flatten)]
    pub metrics: MetricSet<ComparedMetric>,
    /// Set when either commit has no runs for the workload
    pub missing_results: bool,
}

impl CompareResult {
    /// Significant regressions, one line per reason
    pub fn regression_reasons(&self) -> Vec<String> {
        regression_reasons(&self.metrics)
    }
}

/// One entry of a comparison across every workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadComparison {
    #[serde(rename = "type")]
    pub workload: Workload,
    pub result: CompareResult,
}

/// Signed relative change from `old` to `new`, in percent
///
/// Zero when the centers are equal or the old center is zero.
pub fn delta(old: f64, new: f64) -> f64 {
    if old == new || old == 0.0 {
        return 0.0;
    }
    (new - old) * 100.0 / old
}

/// Compare two samples of the same metric
///
/// The significance test only runs when both samples reach
/// `config.min_sample_size`; otherwise `p` is 1.
pub fn compare_samples(old: &[f64], new: &[f64], config: &EngineConfig) -> ComparedMetric {
    let old_summary = summarize(old, config.confidence_level, config.min_sample_size);
    let new_summary = summarize(new, config.confidence_level, config.min_sample_size);

    let testable = old.len() >= config.min_sample_size && new.len() >= config.min_sample_size;
    let p = if testable {
        mann_whitney_u(old, new).map(|test| test.p).unwrap_or(1.0)
    } else {
        1.0
    };

    ComparedMetric {
        insignificant: p > config.significance_level,
        delta: delta(old_summary.center, new_summary.center),
        p,
        n1: old.len(),
        n2: new.len(),
        old: old_summary,
        new: new_summary,
    }
}

/// Compare every tracked metric between two sets of runs
pub fn compare_runs(old: &[Run], new: &[Run], config: &EngineConfig) -> CompareResult {
    let metrics = MetricSet::from_fn(|metric| {
        let (old_samples, old_missing) = metric_samples(old, metric);
        let (new_samples, new_missing) = metric_samples(new, metric);

        let mut compared = compare_samples(&old_samples, &new_samples, config);
        if old_missing {
            compared.old.range.unknown = true;
        }
        if new_missing {
            compared.new.range.unknown = true;
        }
        if old_missing || new_missing {
            tracing::warn!(%metric, old_missing, new_missing, "metric missing from some runs, counted as 0");
        }
        tracing::debug!(
            %metric,
            old = compared.old.center,
            new = compared.new.center,
            delta = compared.delta,
            p = compared.p,
            "compared metric"
        );
        compared
    });

    CompareResult {
        metrics,
        missing_results: old.is_empty() || new.is_empty(),
    }
}

fn git_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._/-]{1,255}$").expect("valid regex"))
}

/// Reject refs that are empty, too long or contain characters outside
/// `[A-Za-z0-9._/-]`
pub fn validate_ref(git_ref: &str) -> Result<()> {
    if git_ref_re().is_match(git_ref) {
        Ok(())
    } else {
        Err(CompareError::invalid_input(format!(
            "invalid git ref {:?}: expected 1-255 characters from [A-Za-z0-9._/-]",
            git_ref
        )))
    }
}

/// Compares the runs of two commits read from a [`BenchmarkStore`]
///
/// Stateless: every call reads the store afresh, so concurrent calls need no
/// coordination beyond what the store provides.
#[derive(Debug, Clone)]
pub struct ComparisonEngine<S> {
    store: S,
    config: EngineConfig,
}

impl<S: BenchmarkStore> ComparisonEngine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Branches and tags known to the store, `None` when it has no listing
    fn known_refs(&self) -> Result<Option<VitessRefs>> {
        match self.store.refs() {
            Ok(refs) => Ok(Some(refs)),
            Err(CompareError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Commit hash for `name`
    ///
    /// See [`resolve_pair`](Self::resolve_pair).
    pub fn resolve_ref(&self, name: &str) -> Result<String> {
        validate_ref(name)?;
        Ok(resolve_with(self.known_refs()?.as_ref(), name))
    }

    /// Commit hashes for both refs
    ///
    /// A branch or tag name from the store's refs resolves to its commit; any
    /// other ref is taken as a commit hash.
    pub fn resolve_pair(&self, old_ref: &str, new_ref: &str) -> Result<(String, String)> {
        validate_ref(old_ref)?;
        validate_ref(new_ref)?;
        let refs = self.known_refs()?;
        Ok((
            resolve_with(refs.as_ref(), old_ref),
            resolve_with(refs.as_ref(), new_ref),
        ))
    }

    /// Compare `old_ref` against `new_ref` on one workload
    ///
    /// Either ref may be a commit hash, a branch or a tag.
    ///
    /// # Errors
    /// - `InvalidInput` for a malformed ref
    /// - `NotFound` when neither ref has runs for the workload
    /// - `InsufficientSamples` when `strict_samples` is set and a side is short
    /// - store errors, unchanged
    pub fn compare(&self, old_ref: &str, new_ref: &str, workload: Workload) -> Result<CompareResult> {
        let (old_commit, new_commit) = self.resolve_pair(old_ref, new_ref)?;
        self.compare_commits(&old_commit, &new_commit, workload)
    }

    /// Like [`compare`](Self::compare), for refs that are already commit
    /// hashes
    pub fn compare_commits(
        &self,
        old_commit: &str,
        new_commit: &str,
        workload: Workload,
    ) -> Result<CompareResult> {
        let old_runs = self.store.runs_for(old_commit, workload)?;
        let new_runs = self.store.runs_for(new_commit, workload)?;
        tracing::debug!(
            old_commit,
            new_commit,
            %workload,
            old_runs = old_runs.len(),
            new_runs = new_runs.len(),
            "fetched runs"
        );

        if old_runs.is_empty() && new_runs.is_empty() {
            return Err(CompareError::not_found(format!(
                "{} and {} on {}",
                old_commit, new_commit, workload
            )));
        }

        let needed = self.config.min_sample_size;
        if self.config.strict_samples && (old_runs.len() < needed || new_runs.len() < needed) {
            return Err(CompareError::InsufficientSamples {
                needed,
                old: old_runs.len(),
                new: new_runs.len(),
            });
        }

        Ok(compare_runs(&old_runs, &new_runs, &self.config))
    }

    /// Compare `old_ref` against `new_ref` on every workload
    ///
    /// Workloads where neither ref has runs are reported with
    /// `missing_results`. Fails with `NotFound` only when that holds for
    /// every workload.
    pub fn compare_all(&self, old_ref: &str, new_ref: &str) -> Result<Vec<WorkloadComparison>> {
        let (old_commit, new_commit) = self.resolve_pair(old_ref, new_ref)?;
        compare_each_workload(&old_commit, &new_commit, &self.config, |workload| {
            self.compare_commits(&old_commit, &new_commit, workload)
        })
    }
}

fn resolve_with(refs: Option<&VitessRefs>, name: &str) -> String {
    match refs.and_then(|refs| refs.resolve(name)) {
        Some(commit) => {
            tracing::debug!(name, commit, "resolved ref");
            commit.to_string()
        }
        None => name.to_string(),
    }
}

/// Run `compare` for every workload, with the `NotFound` handling of
/// [`ComparisonEngine::compare_all`]
///
/// Lets callers put a cache in front of the per-workload comparison.
pub fn compare_each_workload<F>(
    old_ref: &str,
    new_ref: &str,
    config: &EngineConfig,
    mut compare: F,
) -> Result<Vec<WorkloadComparison>>
where
    F: FnMut(Workload) -> Result<CompareResult>,
{
    let mut comparisons = Vec::with_capacity(Workload::ALL.len());
    let mut found = false;
    for workload in Workload::ALL {
        let result = match compare(workload) {
            Ok(result) => {
                found = true;
                result
            }
            Err(CompareError::NotFound(_)) => compare_runs(&[], &[], config),
            Err(e) => return Err(e),
        };
        comparisons.push(WorkloadComparison { workload, result });
    }
    if !found {
        return Err(CompareError::not_found(format!(
            "{} and {} on any workload",
            old_ref, new_ref
        )));
    }
    Ok(comparisons)
}

#[cfg(test)]
mod tests;
