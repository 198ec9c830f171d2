//! Turns the latest guest samples into the usage figures a server record carries.

use crate::influx::InfluxReader;
use serde::Serialize;
use serde_json::Value;

pub const VM_CPU: &str = "vm_cpu";
pub const VM_MEM: &str = "vm_mem";
pub const AGENT_DISK: &str = "agent_disk";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub cpu_usage: String,
    pub mem_usage: String,
    pub disk_usage: String,
}

impl Usage {
    fn slot(&mut self, measurement: &str) -> Option<(&'static str, &mut String)> {
        match measurement {
            AGENT_DISK => Some(("used_percent", &mut self.disk_usage)),
            VM_MEM => Some(("used_percent", &mut self.mem_usage)),
            VM_CPU => Some(("usage_active", &mut self.cpu_usage)),
            _ => None,
        }
    }
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn latest_sample_query(measurement: &str, vm_id: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE vm_id = '{}' ORDER BY time DESC LIMIT 1",
        measurement,
        vm_id.replace('\'', "\\'")
    )
}

/// Reads the newest sample of each measurement for `vm_id`. The first
/// measurement without data ends the scan; fields never seen stay empty.
pub async fn analyse(reader: &InfluxReader, measurements: &[String], vm_id: &str) -> Usage {
    let mut usage = Usage::default();
    for measurement in measurements {
        let results = match reader.query(&latest_sample_query(measurement, vm_id)).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(vm_id, measurement = %measurement, "query vm err: {:#}", e);
                Vec::new()
            }
        };
        if results.iter().all(|series| series.is_empty()) {
            tracing::debug!(vm_id, measurement = %measurement, "no samples");
            break;
        }
        let Some((column, field)) = usage.slot(measurement) else {
            tracing::warn!("Unsupported measurement {}", measurement);
            continue;
        };
        for series in results.iter().flatten() {
            if let Some(value) = series.first(column).and_then(render) {
                *field = value;
            }
        }
    }
    usage
}
