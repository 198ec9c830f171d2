use crate::compute_api::ComputeClient;
use crate::config::Config;
use crate::influx::InfluxReader;
use crate::metrics::analyse;
use anyhow::Result;
use std::future::Future;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub servers: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Copies guest usage from InfluxDB onto the server records, one pass per tick.
pub struct HostMetricsSync {
    reader: InfluxReader,
    compute: ComputeClient,
    measurements: Vec<String>,
    interval: Duration,
}

impl HostMetricsSync {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            reader: InfluxReader::new(&config.influxdb)?,
            compute: ComputeClient::new(&config.compute)?,
            measurements: config.sync.measurements.clone(),
            interval: Duration::from_secs(config.sync.interval_seconds.max(1)),
        })
    }

    pub async fn sync_once(&self) -> Result<SyncReport> {
        let ids = self.compute.list_server_ids().await?;
        let mut report = SyncReport {
            servers: ids.len(),
            ..Default::default()
        };
        for id in &ids {
            let usage = analyse(&self.reader, &self.measurements, id).await;
            match self.compute.update_usage(id, &usage).await {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    error!(server_id = %id, "sync update host data err: {:#}", e);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    /// Runs a pass every interval until `shutdown` resolves. The first pass
    /// starts one interval after launch.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(
            interval_seconds = self.interval.as_secs(),
            measurements = ?self.measurements,
            "Starting host metrics sync"
        );
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.sync_once().await {
                        Ok(report) => info!(
                            servers = report.servers,
                            updated = report.updated,
                            failed = report.failed,
                            "Host metrics synced"
                        ),
                        Err(e) => warn!("Host metrics sync failed: {:#}", e),
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutting down host metrics sync");
                    return Ok(());
                }
            }
        }
    }
}
