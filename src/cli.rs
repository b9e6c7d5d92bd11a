//! CLI argument parsing for arewefastyet

use crate::config::Config;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format, same shape as the HTTP API
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "arewefastyet")]
#[command(version)]
#[command(about = "Compare Vitess macro benchmark runs between commits", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Where benchmark runs are read from
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Results dataset file (JSON)
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Base URL of an upstream results API
    #[arg(long, value_name = "URL", conflicts_with = "data")]
    pub upstream: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API
    Serve {
        #[command(flatten)]
        store: StoreArgs,

        /// Address to listen on (e.g. 0.0.0.0:8080)
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,

        /// Comparison cache TTL in seconds (0 disables caching)
        #[arg(long, value_name = "SECS")]
        cache_ttl: Option<u64>,
    },

    /// Compare two commits
    Compare {
        #[command(flatten)]
        store: StoreArgs,

        /// Baseline commit or ref
        #[arg(long, value_name = "REF")]
        old: String,

        /// Candidate commit or ref
        #[arg(long, value_name = "REF")]
        new: String,

        /// Workload to compare (default: every workload)
        #[arg(long, short = 'w')]
        workload: Option<String>,

        /// Significance level for the Mann-Whitney U test
        #[arg(long, value_name = "ALPHA")]
        significance: Option<f64>,

        /// Fail when either commit has fewer runs than the minimum sample size
        #[arg(long)]
        strict: bool,

        /// Exit with an error when a regression is detected
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format (text or json)
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Summarize recent runs per commit
    Daily {
        #[command(flatten)]
        store: StoreArgs,

        /// Comma-separated workloads (default: every workload)
        #[arg(long, value_name = "LIST")]
        workloads: Option<String>,

        /// Window length in days
        #[arg(long, value_name = "DAYS")]
        days: Option<u32>,

        /// Run source to summarize (e.g. cron)
        #[arg(long)]
        source: Option<String>,

        /// Output format (text or json)
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Check the configuration and, if given, a dataset file
    Validate {
        /// Results dataset file (JSON)
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,
    },
}

impl StoreArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.data {
            config.store.path = Some(path.clone());
            config.store.upstream_url = None;
        }
        if let Some(url) = &self.upstream {
            config.store.upstream_url = Some(url.clone());
            config.store.path = None;
        }
    }
}

impl Command {
    /// Apply command-line overrides on top of file configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        match self {
            Command::Serve {
                store,
                listen,
                cache_ttl,
            } => {
                store.apply(config);
                if let Some(listen) = listen {
                    config.server.listen = listen.clone();
                }
                if let Some(ttl) = cache_ttl {
                    config.cache.ttl_secs = *ttl;
                }
            }
            Command::Compare {
                store,
                significance,
                strict,
                ..
            } => {
                store.apply(config);
                if let Some(alpha) = significance {
                    config.engine.significance_level = *alpha;
                }
                if *strict {
                    config.engine.strict_samples = true;
                }
            }
            Command::Daily {
                store,
                days,
                source,
                ..
            } => {
                store.apply(config);
                if let Some(days) = days {
                    config.daily.window_days = *days;
                }
                if let Some(source) = source {
                    config.daily.source = source.clone();
                }
            }
            Command::Validate { data } => {
                if let Some(path) = data {
                    config.store.path = Some(path.clone());
                    config.store.upstream_url = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_compare() {
        let cli = Cli::parse_from([
            "arewefastyet",
            "compare",
            "--old",
            "aaa",
            "--new",
            "bbb",
            "-w",
            "oltp",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Compare {
                old,
                new,
                workload,
                format,
                ..
            } => {
                assert_eq!(old, "aaa");
                assert_eq!(new, "bbb");
                assert_eq!(workload.as_deref(), Some("oltp"));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["arewefastyet", "validate", "--debug", "--config", "aw.toml"]);
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("aw.toml")));
    }

    #[test]
    fn test_cli_format_defaults_to_text() {
        let cli = Cli::parse_from(["arewefastyet", "daily"]);
        match cli.command {
            Command::Daily { format, .. } => assert_eq!(format, OutputFormat::Text),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_compare_requires_refs() {
        assert!(Cli::try_parse_from(["arewefastyet", "compare", "--old", "aaa"]).is_err());
    }

    #[test]
    fn test_cli_data_and_upstream_conflict() {
        let result = Cli::try_parse_from([
            "arewefastyet",
            "serve",
            "--data",
            "results.json",
            "--upstream",
            "http://localhost:9090",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let cli = Cli::parse_from([
            "arewefastyet",
            "serve",
            "--listen",
            "0.0.0.0:9000",
            "--cache-ttl",
            "0",
            "--upstream",
            "http://results:9090",
        ]);
        let mut config = Config::default();
        config.store.path = Some(PathBuf::from("old.json"));
        cli.command.apply_overrides(&mut config);
        assert_eq!(config.server.listen, "0.0.0.0:9000");
        assert_eq!(config.cache.ttl_secs, 0);
        assert_eq!(config.store.upstream_url.as_deref(), Some("http://results:9090"));
        assert!(config.store.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_compare_overrides() {
        let cli = Cli::parse_from([
            "arewefastyet",
            "compare",
            "--old",
            "a",
            "--new",
            "b",
            "--significance",
            "0.01",
            "--strict",
        ]);
        let mut config = Config::default();
        cli.command.apply_overrides(&mut config);
        assert_eq!(config.engine.significance_level, 0.01);
        assert!(config.engine.strict_samples);
    }
}
