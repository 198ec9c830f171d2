//! Write side: the region service's `servers` resource.

use crate::config::ComputeApiConfig;
use crate::metrics::{Usage, AGENT_DISK, VM_CPU, VM_MEM};
use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

const AUTH_HEADER: &str = "X-Auth-Token";

#[derive(Debug, Deserialize)]
struct ServerRow {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct ServerPage {
    #[serde(default)]
    servers: Vec<ServerRow>,
    #[serde(default)]
    total: Option<u64>,
}

pub struct ComputeClient {
    client: Client,
    endpoint: String,
    token: String,
    page_size: u32,
}

impl ComputeClient {
    pub fn new(config: &ComputeApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            page_size: config.page_size.max(1),
        })
    }

    async fn list_page(&self, offset: u64) -> Result<ServerPage> {
        let path = "/servers";
        let response = self
            .client
            .get(format!("{}{}", self.endpoint, path))
            .header(AUTH_HEADER, &self.token)
            .query(&[
                ("limit", self.page_size.to_string()),
                ("offset", offset.to_string()),
                ("details", "false".to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to GET {}", path))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;
        if !status.is_success() {
            bail!("HTTP {} for GET {}: {}", status, path, body);
        }
        serde_json::from_str(&body)
            .with_context(|| format!("Failed to deserialize response from GET {}: {}", path, body))
    }

    /// Ids of every server the token can see.
    pub async fn list_server_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut offset = 0u64;
        loop {
            let page = self.list_page(offset).await?;
            let fetched = page.servers.len() as u64;
            offset += fetched;
            ids.extend(
                page.servers
                    .into_iter()
                    .map(|s| s.id)
                    .filter(|id| !id.is_empty()),
            );
            let done = match page.total {
                Some(total) => offset >= total,
                None => fetched < self.page_size as u64,
            };
            if fetched == 0 || done {
                return Ok(ids);
            }
        }
    }

    async fn update(&self, server_id: &str, fields: Map<String, Value>) -> Result<()> {
        let path = format!("/servers/{}", urlencoding::encode(server_id));
        let response = self
            .client
            .put(format!("{}{}", self.endpoint, path))
            .header(AUTH_HEADER, &self.token)
            .json(&json!({ "server": fields }))
            .send()
            .await
            .with_context(|| format!("Failed to PUT {}", path))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP {} for PUT {}: {}", status, path, body);
        }
        Ok(())
    }

    pub async fn update_usage(&self, server_id: &str, usage: &Usage) -> Result<()> {
        let mut fields = Map::new();
        fields.insert("cpu_usage".into(), Value::String(usage.cpu_usage.clone()));
        fields.insert("mem_usage".into(), Value::String(usage.mem_usage.clone()));
        fields.insert("disk_usage".into(), Value::String(usage.disk_usage.clone()));
        self.update(server_id, fields).await
    }

    /// Publishes a single figure named after the measurement it came from.
    pub async fn update_usage_field(
        &self,
        server_id: &str,
        measurement: &str,
        usage: &str,
    ) -> Result<()> {
        let key = match measurement {
            VM_CPU => "cpu_usage",
            VM_MEM => "mem_usage",
            AGENT_DISK => "disk_usage",
            other => bail!("unsupported measurement {}", other),
        };
        let mut fields = Map::new();
        fields.insert(key.into(), Value::String(usage.to_string()));
        self.update(server_id, fields).await
    }
}
