use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use orchestrator_config::{ConfigFormat, ConfigManager};
use unified_orchestrator::UnifiedOrchestrator;

#[derive(Parser)]
#[command(name = "unified-orchestrator", version, about = "Registers subsystems, connects them and keeps them coordinated")]
struct Cli {
    /// Environment name reported by the deployment
    #[arg(default_value = "local")]
    environment: String,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `orchestrator_core=debug`
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Maintenance tick interval in milliseconds
    #[arg(long)]
    tick_interval_ms: Option<u64>,

    /// Seed for the maintenance tick's random source
    #[arg(long)]
    seed: Option<u64>,

    /// Activate, print the report and exit
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long, default_value_t = false)]
    dump_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_manager = Arc::new(ConfigManager::new(cli.config.clone()).context("failed to load configuration")?);

    config_manager
        .update(|config| {
            config.environment = cli.environment.clone();
            if let Some(level) = &cli.log_level {
                config.logging.level = level.clone();
            }
            if cli.json_logs {
                config.logging.json = true;
            }
            if let Some(dir) = &cli.log_dir {
                config.logging.directory = Some(dir.clone());
            }
            if let Some(interval) = cli.tick_interval_ms {
                config.tick_interval_ms = interval;
            }
            if let Some(seed) = cli.seed {
                config.rng_seed = Some(seed);
            }
        })
        .context("invalid command-line override")?;

    if cli.dump_config {
        println!("{}", config_manager.render(ConfigFormat::Toml)?);
        return Ok(ExitCode::SUCCESS);
    }

    logging::init(&config_manager.config().logging)?;

    let orchestrator = UnifiedOrchestrator::new(config_manager)?;
    let report = orchestrator.deploy().await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if cli.once {
        orchestrator.shutdown().await;
        return Ok(if report.outcome.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(2)
        });
    }

    info!("Unified orchestrator is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    orchestrator.shutdown().await;
    let status = orchestrator.status();
    info!(
        "Stopped after {} maintenance ticks ({} rebalances)",
        status.heartbeat.ticks, status.metrics.rebalances
    );

    Ok(ExitCode::SUCCESS)
}
