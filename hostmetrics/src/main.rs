use anyhow::Result;
use clap::{Parser, Subcommand};
use hostmetrics::{Config, HostMetricsSync};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "hostmetrics-agent", version)]
#[command(about = "Syncs guest usage from InfluxDB to the compute service", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "hostmetrics.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync on every interval until interrupted
    Run,
    /// Run a single sync pass and exit
    Once,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let sync = HostMetricsSync::from_config(&config)?;

    match cli.command {
        Commands::Run => {
            sync.run(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            })
            .await
        }
        Commands::Once => {
            let report = sync.sync_once().await?;
            info!(
                servers = report.servers,
                updated = report.updated,
                failed = report.failed,
                "Host metrics synced"
            );
            Ok(())
        }
    }
}
