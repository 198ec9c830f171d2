//! Periodically copies guest CPU, memory and disk usage from InfluxDB onto
//! the compute service's server records.

pub mod compute_api;
pub mod config;
pub mod influx;
pub mod metrics;
pub mod sync;

pub use config::Config;
pub use metrics::{analyse, Usage};
pub use sync::{HostMetricsSync, SyncReport};
