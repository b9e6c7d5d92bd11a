use anyhow::{Context, Result};
use arewefastyet::cli::{Cli, Command, OutputFormat};
use arewefastyet::compare::ComparisonEngine;
use arewefastyet::config::{Config, StoreConfig};
use arewefastyet::server::{self, AppState, SharedStore};
use arewefastyet::store::{Dataset, JsonStore, UpstreamStore};
use arewefastyet::workload::Workload;
use arewefastyet::{daily, report};
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber (logs go to stderr)
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::default(),
    };
    cli.command.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn open_store(config: &StoreConfig) -> Result<SharedStore> {
    match (&config.path, &config.upstream_url) {
        (Some(path), _) => {
            let store = JsonStore::open(path)
                .with_context(|| format!("Failed to load dataset: {}", path.display()))?;
            Ok(Arc::new(store))
        }
        (None, Some(url)) => {
            tracing::info!(%url, "using upstream results API");
            Ok(Arc::new(UpstreamStore::new(url.as_str(), config.timeout())?))
        }
        (None, None) => anyhow::bail!(
            "No results source: pass --data FILE or --upstream URL, or set [store] in the config"
        ),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_serve(config: &Config) -> Result<()> {
    let store = open_store(&config.store)?;
    let state = AppState::new(Arc::clone(&store), config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(server::serve(&config.server.listen, state))?;

    // The blocking HTTP client must be dropped outside the runtime.
    drop(runtime);
    drop(store);
    Ok(())
}

fn run_compare(
    config: &Config,
    old: &str,
    new: &str,
    workload: Option<&str>,
    fail_on_regression: bool,
    format: OutputFormat,
) -> Result<()> {
    let engine = ComparisonEngine::new(open_store(&config.store)?, config.engine.clone());

    let results = match workload {
        Some(name) => {
            let workload: Workload = name.parse()?;
            let result = engine.compare(old, new, workload)?;
            match format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Text => print!("{}", report::compare_report(old, new, workload, &result)),
            }
            vec![result]
        }
        None => {
            let comparisons = engine.compare_all(old, new)?;
            match format {
                OutputFormat::Json => print_json(&comparisons)?,
                OutputFormat::Text => {
                    for c in comparisons.iter().filter(|c| !c.result.missing_results) {
                        println!("{}", report::compare_report(old, new, c.workload, &c.result));
                    }
                }
            }
            comparisons.into_iter().map(|c| c.result).collect()
        }
    };

    if fail_on_regression && results.iter().any(|r| !r.regression_reasons().is_empty()) {
        anyhow::bail!("Regression detected between {} and {}", old, new);
    }
    Ok(())
}

fn run_daily(config: &Config, workloads: Option<&str>, format: OutputFormat) -> Result<()> {
    let workloads = Workload::parse_list(workloads.unwrap_or_default())?;
    let store = open_store(&config.store)?;
    let data = daily::daily(&store, &workloads, &config.daily, &config.engine, Utc::now())?;
    match format {
        OutputFormat::Json => print_json(&data)?,
        OutputFormat::Text => print!("{}", report::daily_report(&data)),
    }
    Ok(())
}

fn run_validate(config: &Config) -> Result<()> {
    println!("✓ configuration OK");
    if let Some(path) = &config.store.path {
        let dataset = Dataset::from_file(path)
            .with_context(|| format!("Invalid dataset: {}", path.display()))?;
        println!(
            "✓ dataset OK: {} runs, {} executions, {} refs",
            dataset.runs.len(),
            dataset.executions.len(),
            dataset.refs.branches.len() + dataset.refs.tags.len()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = load_config(&cli)?;
    tracing::debug!(?config, "configuration loaded");

    match &cli.command {
        Command::Serve { .. } => run_serve(&config),
        Command::Compare {
            old,
            new,
            workload,
            fail_on_regression,
            format,
            ..
        } => run_compare(
            &config,
            old,
            new,
            workload.as_deref(),
            *fail_on_regression,
            *format,
        ),
        Command::Daily {
            workloads, format, ..
        } => run_daily(&config, workloads.as_deref(), *format),
        Command::Validate { .. } => run_validate(&config),
    }
}
