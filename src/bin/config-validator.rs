//! # Pipeline Configuration Validator
//!
//! Loads a pipeline configuration the same way the library does (defaults, optional
//! file, `PIPELINE_*` environment overrides), validates it, and prints the effective
//! values. Exits non-zero when the configuration is invalid.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pipeline_core::config::{ConfigManager, PipelineConfig, RedeliveryPolicy};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate pipeline configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file (TOML, YAML or JSON); defaults only when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    match run(&cli) {
        Ok(()) => {
            info!("Configuration validation completed successfully");
        }
        Err(e) => {
            error!("Configuration validation failed: {:#}", e);
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let manager = ConfigManager::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("loading {}", path.display()),
        None => "loading defaults".to_string(),
    })?;

    match cli.format {
        OutputFormat::Json => {
            let rendered = serde_json::to_string_pretty(manager.config())
                .context("serializing configuration")?;
            println!("{rendered}");
        }
        OutputFormat::Table => print_table(&manager),
    }
    Ok(())
}

fn print_table(manager: &ConfigManager) {
    let config: &PipelineConfig = manager.config();

    println!("🔧 Pipeline Configuration");
    println!("Environment: {}", manager.environment());
    match manager.config_file() {
        Some(path) => println!("Config File: {}", path.display()),
        None => println!("Config File: (defaults)"),
    }
    println!();

    let redelivery = match config.delivery.redelivery {
        RedeliveryPolicy::Disabled => "disabled".to_string(),
        RedeliveryPolicy::Retry { max_attempts } => format!("retry (max {max_attempts})"),
    };
    let optional = |value: Option<u64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());

    let rows: Vec<(&str, String)> = vec![
        ("concurrency.min", config.concurrency.min.to_string()),
        ("concurrency.max", config.concurrency.max.to_string()),
        ("concurrency.initial", config.concurrency.initial.to_string()),
        ("cache.ttl_ms", config.cache.ttl_ms.to_string()),
        ("cache.capacity", config.cache.capacity.to_string()),
        ("rate_limit.window_ms", config.rate_limit.window_ms.to_string()),
        ("rate_limit.max_per_window", config.rate_limit.max_per_window.to_string()),
        ("retry.max_attempts", config.retry.max_attempts.to_string()),
        ("retry.base_delay_ms", config.retry.base_delay_ms.to_string()),
        ("retry.jitter_ms", config.retry.jitter_ms.to_string()),
        ("retry.max_delay_ms", config.retry.max_delay_ms.to_string()),
        ("retry.attempt_timeout_ms", optional(config.retry.attempt_timeout_ms)),
        ("retry.seed", optional(config.retry.seed)),
        ("throttle.sample_window_size", config.throttle.sample_window_size.to_string()),
        ("throttle.high_watermark", config.throttle.high_watermark.to_string()),
        ("throttle.low_watermark", config.throttle.low_watermark.to_string()),
        ("throttle.latency_budget_ms", config.throttle.latency_budget_ms.to_string()),
        ("delivery.redelivery", redelivery),
        ("insight.lookback_hours", config.insight.lookback_hours.to_string()),
        (
            "selection.dedupe_across_batch",
            config.selection.dedupe_across_batch.to_string(),
        ),
    ];

    let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, value) in rows {
        println!("  {key:<width$}  {value}");
    }
    println!();
    println!("✅ Configuration is valid");
}
