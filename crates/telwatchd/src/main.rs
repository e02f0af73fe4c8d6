//! telwatchd — the telwatch daemon.
//!
//! Loads a service list, checks every service each cycle, and (with
//! `--auto-recover`) runs the configured recovery action for services that
//! fail. Ctrl-C stops the loop after the current cycle and prints final
//! statistics.
//!
//! # Usage
//!
//! ```text
//! telwatchd --config config.json --auto-recover
//! ```

mod console;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use telwatch_config::MonitorConfig;
use telwatch_health::HealthChecker;
use telwatch_monitor::{IncidentLog, Monitor};
use telwatch_recovery::{RecoveryEngine, RecoveryState, SimulatedCapability};

use crate::console::{print_final_stats, ConsoleReporter};

#[derive(Parser)]
#[command(
    name = "telwatchd",
    about = "Telecom service health monitor & auto-recovery",
    version
)]
struct Cli {
    /// Path to the configuration file (JSON, or TOML with a .toml extension).
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Run the configured recovery action for unhealthy services.
    #[arg(long)]
    auto_recover: bool,

    /// Enable debug logging for telwatch crates.
    #[arg(short, long)]
    verbose: bool,

    /// File that receives one line per unhealthy check.
    #[arg(long, default_value = "incidents.log")]
    incident_log: PathBuf,

    /// Run a single check cycle and exit.
    #[arg(long)]
    once: bool,

    /// Delay of each simulated recovery step, in milliseconds.
    #[arg(long, default_value = "500")]
    step_delay_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "info,telwatchd=debug,telwatch_config=debug,telwatch_health=debug,telwatch_recovery=debug,telwatch_monitor=debug"
    } else {
        "warn,telwatchd=info,telwatch_recovery=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_filter))?,
        )
        .init();

    let config = MonitorConfig::from_file(&cli.config)
        .with_context(|| format!("invalid configuration {}", cli.config.display()))?;

    print_banner(&cli, &config);

    let mut monitor = Monitor::new(config, Arc::new(HealthChecker::new()))
        .with_reporter(Arc::new(ConsoleReporter::new(cli.auto_recover)))
        .with_incident_sink(Arc::new(IncidentLog::new(&cli.incident_log)));

    if cli.auto_recover {
        let capability = SimulatedCapability::new(Duration::from_millis(cli.step_delay_ms));
        monitor = monitor.with_recovery(RecoveryEngine::new(
            RecoveryState::new(),
            Arc::new(capability),
        ));
    }

    let stats = if cli.once {
        monitor.run_cycle().await;
        *monitor.stats()
    } else {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Graceful shutdown on Ctrl-C: the monitor finishes its current cycle.
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("shutdown signal received");
                    println!("\n\nShutting down gracefully...");
                    let _ = shutdown_tx.send(true);
                }
                Err(e) => {
                    // Keep the sender alive so the monitor keeps cycling.
                    warn!(error = %e, "failed to install Ctrl-C handler");
                    std::future::pending::<()>().await;
                }
            }
        });

        monitor.run(shutdown_rx).await
    };

    print_final_stats(
        &stats,
        cli.auto_recover,
        &cli.incident_log.display().to_string(),
    );
    info!("telwatchd stopped");
    Ok(())
}

fn print_banner(cli: &Cli, config: &MonitorConfig) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("🔧 Telecom Service Health Monitor & Auto-Recovery");
    println!("{rule}");
    println!("Configuration: {}", cli.config.display());
    println!("Services loaded: {}", config.services.len());
    println!(
        "Auto-recovery: {}",
        if cli.auto_recover { "ENABLED" } else { "DISABLED" }
    );
    println!(
        "Check interval: {} seconds",
        config.check_interval.as_secs_f64()
    );
    println!("{rule}");
}
