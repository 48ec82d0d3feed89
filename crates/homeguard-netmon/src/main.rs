//! CLI entry point for the homeguard-netmon device monitor.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use homeguard_registry::{stats, JsonFileStore};

use homeguard_netmon::config::{load_netmon_config, NetmonConfig};
use homeguard_netmon::cycle::MonitorCycle;
use homeguard_netmon::scheduler::MonitorScheduler;

#[derive(Parser)]
#[command(name = "homeguard-netmon")]
#[command(about = "Discovers and monitors devices on the local network")]
struct Cli {
    /// Run a single scan cycle and exit.
    #[arg(long)]
    once: bool,

    /// Run as daemon with periodic scans.
    #[arg(long)]
    daemon: bool,

    /// Print stats of the persisted device registry as JSON and exit.
    #[arg(long)]
    stats: bool,

    /// Override the data directory (registry and activity log).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Network to scan (CIDR), instead of the local /24.
    #[arg(short, long)]
    network: Option<String>,

    /// Config file prefix (default: homeguard).
    #[arg(short, long, default_value = "homeguard")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let config = apply_overrides(load_netmon_config(&cli.config)?, &cli);

    if cli.stats {
        let store = JsonFileStore::new(config.devices_path());
        let current = stats::stored_stats(&store);
        println!("{}", current.to_json_pretty()?);
    } else if cli.once {
        let mut cycle = MonitorCycle::from_config(&config)?;
        let report = cycle.run_once().await?;
        println!("{}", report.stats.to_json_pretty()?);
    } else if cli.daemon {
        let cycle = MonitorCycle::from_config(&config)?;
        let scheduler = MonitorScheduler::new(cycle, config.scan_interval());
        scheduler.run(shutdown_signal()).await?;
    } else {
        anyhow::bail!("Specify --once (single cycle), --daemon (periodic scans) or --stats");
    }

    Ok(())
}

fn apply_overrides(mut config: NetmonConfig, cli: &Cli) -> NetmonConfig {
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(network) = &cli.network {
        config.network = Some(network.clone());
    }
    config
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
