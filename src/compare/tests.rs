// Comparison engine tests
//
// Runs are built in memory and served through a JsonStore, the same path the
// CLI takes with a dataset file.

use super::*;
use crate::run::{ExecutionMetrics, Qps, RunResult, VitessRef, VitessRefs};
use crate::store::{Dataset, JsonStore};
use std::collections::BTreeMap;

fn run(git_ref: &str, workload: Workload, qps: f64) -> Run {
    let mut cpu = BTreeMap::new();
    cpu.insert("vtgate".to_string(), qps / 10.0);
    cpu.insert("vttablet".to_string(), qps / 5.0);
    let mut mem = BTreeMap::new();
    mem.insert("vtgate".to_string(), 1.0e6);
    mem.insert("vttablet".to_string(), 2.0e6);

    Run {
        id: 0,
        git_ref: git_ref.to_string(),
        workload,
        source: "cron".to_string(),
        created_at: None,
        exec_uuid: None,
        result: RunResult {
            qps: Qps {
                total: Some(qps),
                reads: Some(qps * 0.7),
                writes: Some(qps * 0.2),
                other: Some(qps * 0.1),
            },
            tps: Some(qps / 20.0),
            latency: Some(10_000.0 / qps),
            errors: Some(0.0),
            reconnects: Some(0.0),
            time: Some(60.0),
            threads: Some(16.0),
        },
        metrics: ExecutionMetrics {
            total_components_cpu_time: Some(qps * 0.3),
            components_cpu_time: cpu,
            total_components_mem_stats_alloc_bytes: Some(3.0e6),
            components_mem_stats_alloc_bytes: mem,
        },
    }
}

fn runs(git_ref: &str, workload: Workload, values: &[f64]) -> Vec<Run> {
    values.iter().map(|&v| run(git_ref, workload, v)).collect()
}

fn engine(runs: Vec<Run>, config: EngineConfig) -> ComparisonEngine<JsonStore> {
    let dataset = Dataset {
        runs,
        ..Dataset::default()
    };
    ComparisonEngine::new(JsonStore::new(dataset), config)
}

const OLD: [f64; 5] = [100.0, 102.0, 98.0, 101.0, 99.0];
const NEW: [f64; 5] = [150.0, 148.0, 152.0, 149.0, 151.0];

fn scenario_engine() -> ComparisonEngine<JsonStore> {
    let mut all = runs("aaa111", Workload::Oltp, &OLD);
    all.extend(runs("bbb222", Workload::Oltp, &NEW));
    engine(all, EngineConfig::default())
}

/// Scenario: QPS rises by half across every run
/// Expected: ~50% delta, significant
#[test]
fn test_scenario_large_improvement() {
    let result = scenario_engine()
        .compare("aaa111", "bbb222", Workload::Oltp)
        .unwrap();
    let qps = result.metrics.total_qps;
    assert!((qps.delta - 50.0).abs() < 1.0, "delta {}", qps.delta);
    assert!(!qps.insignificant);
    assert_eq!(qps.n1, 5);
    assert_eq!(qps.n2, 5);
    assert!(!result.missing_results);
}

#[test]
fn test_insignificant_matches_threshold_for_every_metric() {
    let engine = scenario_engine();
    let result = engine.compare("aaa111", "bbb222", Workload::Oltp).unwrap();
    for (metric, compared) in result.metrics.iter() {
        assert_eq!(
            compared.insignificant,
            compared.p > engine.config().significance_level,
            "{}",
            metric
        );
    }
}

#[test]
fn test_delta_of_ten_percent() {
    assert_eq!(delta(100.0, 110.0), 10.0);
    assert!((delta(200.0, 150.0) + 25.0).abs() < 1e-12);
}

#[test]
fn test_delta_zero_cases() {
    assert_eq!(delta(0.0, 0.0), 0.0);
    assert_eq!(delta(0.0, 5.0), 0.0);
    assert_eq!(delta(42.0, 42.0), 0.0);
}

#[test]
fn test_delta_sign_follows_center() {
    let result = scenario_engine()
        .compare("aaa111", "bbb222", Workload::Oltp)
        .unwrap();
    for (metric, compared) in result.metrics.iter() {
        if compared.new.center > compared.old.center && compared.old.center != 0.0 {
            assert!(compared.delta > 0.0, "{}", metric);
        }
    }
    // Latency is derived as 10_000 / qps, so it falls.
    assert!(result.metrics.latency.delta < 0.0);
}

/// Scenario: old commit has no runs
/// Expected: result returned, flagged missing, nothing significant
#[test]
fn test_missing_old_runs() {
    let engine = engine(runs("bbb222", Workload::Oltp, &NEW), EngineConfig::default());
    let result = engine.compare("aaa111", "bbb222", Workload::Oltp).unwrap();
    assert!(result.missing_results);
    for (_, compared) in result.metrics.iter() {
        assert!(compared.insignificant);
        assert_eq!(compared.p, 1.0);
        assert_eq!(compared.n1, 0);
        assert!(compared.old.range.unknown);
    }
}

#[test]
fn test_no_runs_at_all_is_not_found() {
    let engine = engine(Vec::new(), EngineConfig::default());
    let err = engine.compare("aaa111", "bbb222", Workload::Oltp).unwrap_err();
    assert!(matches!(err, CompareError::NotFound(_)));
}

#[test]
fn test_identical_samples() {
    let mut all = runs("aaa111", Workload::Tpcc, &OLD);
    all.extend(runs("bbb222", Workload::Tpcc, &OLD));
    let engine = engine(all, EngineConfig::default());
    let result = engine.compare("aaa111", "bbb222", Workload::Tpcc).unwrap();
    let qps = result.metrics.total_qps;
    assert_eq!(qps.p, 1.0);
    assert!(qps.insignificant);
    assert_eq!(qps.delta, 0.0);
}

#[test]
fn test_compare_is_idempotent() {
    let engine = scenario_engine();
    let first = engine.compare("aaa111", "bbb222", Workload::Oltp).unwrap();
    let second = engine.compare("aaa111", "bbb222", Workload::Oltp).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_metric_flags_unknown_range() {
    let mut old = runs("aaa111", Workload::Oltp, &OLD);
    old[0].result.tps = None;
    let mut all = old;
    all.extend(runs("bbb222", Workload::Oltp, &NEW));
    let engine = engine(all, EngineConfig::default());

    let result = engine.compare("aaa111", "bbb222", Workload::Oltp).unwrap();
    assert!(result.metrics.tps.old.range.unknown);
    assert!(!result.metrics.tps.new.range.unknown);
    assert!(!result.metrics.total_qps.old.range.unknown);
}

#[test]
fn test_undersized_sample_skips_test() {
    let mut all = runs("aaa111", Workload::Oltp, &[100.0]);
    all.extend(runs("bbb222", Workload::Oltp, &NEW));
    let engine = engine(all, EngineConfig::default());

    let result = engine.compare("aaa111", "bbb222", Workload::Oltp).unwrap();
    let qps = result.metrics.total_qps;
    assert_eq!(qps.p, 1.0);
    assert!(qps.insignificant);
    assert!(qps.old.range.unknown);
    assert!((qps.delta - 50.0).abs() < 1e-9);
}

#[test]
fn test_strict_samples_rejects_short_side() {
    let mut all = runs("aaa111", Workload::Oltp, &[100.0, 101.0]);
    all.extend(runs("bbb222", Workload::Oltp, &NEW));
    let engine = engine(all, EngineConfig::strict());

    let err = engine.compare("aaa111", "bbb222", Workload::Oltp).unwrap_err();
    assert!(matches!(
        err,
        CompareError::InsufficientSamples {
            needed: 5,
            old: 2,
            new: 5
        }
    ));
}

#[test]
fn test_workloads_are_not_mixed() {
    let mut all = scenario_engine().store().dataset().runs.clone();
    all.extend(runs("aaa111", Workload::Tpcc, &[1.0, 2.0, 3.0]));
    let engine = engine(all, EngineConfig::default());
    let result = engine.compare("aaa111", "bbb222", Workload::Oltp).unwrap();
    assert_eq!(result.metrics.total_qps.n1, 5);
}

#[test]
fn test_invalid_refs_rejected() {
    let engine = scenario_engine();
    let too_long = "a".repeat(256);
    for bad in ["", "abc def", "abc;rm", too_long.as_str()] {
        let err = engine.compare(bad, "bbb222", Workload::Oltp).unwrap_err();
        assert!(matches!(err, CompareError::InvalidInput(_)), "{:?}", bad);
    }
}

#[test]
fn test_valid_ref_shapes() {
    for ok in ["main", "release-19.0", "v19.0.0-rc1", "refs/heads/main", "4f1a2b3c"] {
        assert!(validate_ref(ok).is_ok(), "{}", ok);
    }
}

#[test]
fn test_compare_all_lists_every_workload() {
    let comparisons = scenario_engine().compare_all("aaa111", "bbb222").unwrap();
    assert_eq!(comparisons.len(), Workload::ALL.len());
    assert_eq!(comparisons[0].workload, Workload::Oltp);
    assert!(!comparisons[0].result.missing_results);
    assert!(comparisons[1..].iter().all(|c| c.result.missing_results));
}

#[test]
fn test_compare_all_without_runs_is_not_found() {
    let err = scenario_engine().compare_all("ccc", "ddd").unwrap_err();
    assert!(matches!(err, CompareError::NotFound(_)));
}

#[test]
fn test_result_json_shape() {
    let result = scenario_engine()
        .compare("aaa111", "bbb222", Workload::Oltp)
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["missing_results"], false);
    assert_eq!(json["total_qps"]["n1"], 5);
    assert!(json["total_qps"]["old"]["range"]["infinite"].is_boolean());
    assert!(json["components_cpu_time"]["vtgate"]["p"].is_number());
    assert!(json["components_mem_stats_alloc_bytes"]["vttablet"]["insignificant"].is_boolean());
}

#[test]
fn test_regression_reasons_on_slowdown() {
    // new is the slower commit here
    let result = scenario_engine()
        .compare("bbb222", "aaa111", Workload::Oltp)
        .unwrap();
    let reasons = result.regression_reasons();
    assert!(reasons.iter().any(|r| r.starts_with("- TPS decreased by")));
    assert!(reasons.iter().any(|r| r.starts_with("- QPS decreased by")));
    assert!(reasons.iter().any(|r| r.starts_with("- Latency increased by")));
}

fn named_ref(name: &str, commit_hash: &str) -> VitessRef {
    VitessRef {
        name: name.to_string(),
        commit_hash: commit_hash.to_string(),
        version: Default::default(),
        rc_number: 0,
    }
}

/// Branch and tag names compare the commits they point at
#[test]
fn test_branch_and_tag_names_resolve_to_commits() {
    let mut all = runs("aaa111", Workload::Oltp, &OLD);
    all.extend(runs("bbb222", Workload::Oltp, &NEW));
    let engine = ComparisonEngine::new(
        JsonStore::new(Dataset {
            runs: all,
            executions: Vec::new(),
            refs: VitessRefs {
                branches: vec![named_ref("main", "bbb222")],
                tags: vec![named_ref("v19.0.0", "aaa111")],
            },
        }),
        EngineConfig::default(),
    );

    let by_name = engine.compare("v19.0.0", "main", Workload::Oltp).unwrap();
    let by_hash = engine.compare("aaa111", "bbb222", Workload::Oltp).unwrap();
    assert_eq!(by_name, by_hash);
    assert!(!by_name.missing_results);

    assert_eq!(
        engine.resolve_pair("main", "aaa111").unwrap(),
        ("bbb222".to_string(), "aaa111".to_string())
    );
    assert_eq!(engine.resolve_ref("v19.0.0").unwrap(), "aaa111");

    let all = engine.compare_all("v19.0.0", "main").unwrap();
    assert!(!all[0].result.missing_results);
}

/// Without a refs listing, names are taken as commit hashes
#[test]
fn test_unknown_name_is_used_as_commit() {
    let engine = scenario_engine();
    assert_eq!(engine.resolve_ref("aaa111").unwrap(), "aaa111");
    let result = engine.compare("main", "bbb222", Workload::Oltp).unwrap();
    assert!(result.missing_results);
}
