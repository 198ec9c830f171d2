use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Region-service options the compute side reads from its TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct ComputeOptions {
    #[serde(default = "default_disk_size_mb")]
    pub default_disk_size_mb: u64,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self {
            default_disk_size_mb: default_disk_size_mb(),
        }
    }
}

impl ComputeOptions {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse options file: {}", path.display()))
    }
}

fn default_disk_size_mb() -> u64 {
    10240
}
