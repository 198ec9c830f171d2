//! Read side of the InfluxDB 1.x HTTP API.

use crate::config::InfluxConfig;
use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl Series {
    /// Value of `column` in the first row.
    pub fn first(&self, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.first()?.get(idx)
    }
}

#[derive(Debug, Default, Deserialize)]
struct StatementResult {
    #[serde(default)]
    series: Vec<Series>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    error: Option<String>,
}

pub struct InfluxReader {
    client: Client,
    config: InfluxConfig,
}

impl InfluxReader {
    pub fn new(config: &InfluxConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Runs one InfluxQL statement and returns its series, one list per
    /// statement result.
    pub async fn query(&self, sql: &str) -> Result<Vec<Vec<Series>>> {
        tracing::debug!(database = %self.config.database, "influx query: {}", sql);
        let url = format!("{}/query", self.config.url.trim_end_matches('/'));
        let mut params = vec![("db", self.config.database.as_str()), ("q", sql)];
        if let Some(user) = &self.config.username {
            params.push(("u", user.as_str()));
        }
        if let Some(password) = &self.config.password {
            params.push(("p", password.as_str()));
        }

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .with_context(|| format!("Failed to GET {}", url))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;
        if !status.is_success() {
            bail!("HTTP {} for influx query: {}", status, body);
        }

        let parsed: QueryResponse = serde_json::from_str(&body)
            .with_context(|| format!("Failed to deserialize influx response: {}", body))?;
        if let Some(err) = parsed.error {
            bail!("influx error: {}", err);
        }
        parsed
            .results
            .into_iter()
            .map(|r| match r.error {
                Some(err) => bail!("influx statement error: {}", err),
                None => Ok(r.series),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn reader(url: &str) -> InfluxReader {
        InfluxReader::new(&InfluxConfig {
            url: url.to_string(),
            database: "telegraf".to_string(),
            username: Some("reader".to_string()),
            password: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_returns_series() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("db".into(), "telegraf".into()),
                Matcher::UrlEncoded("u".into(), "reader".into()),
                Matcher::UrlEncoded("q".into(), "SELECT * FROM vm_cpu".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results":[{"statement_id":0,"series":[{"name":"vm_cpu","columns":["time","usage_active"],"values":[["2024-01-01T00:00:00Z",12.5]]}]}]}"#,
            )
            .create_async()
            .await;

        let results = reader(&server.url()).query("SELECT * FROM vm_cpu").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0][0].name, "vm_cpu");
        assert_eq!(results[0][0].first("usage_active"), Some(&serde_json::json!(12.5)));
        assert_eq!(results[0][0].first("missing"), None);
    }

    #[tokio::test]
    async fn test_statement_error_is_reported() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"results":[{"statement_id":0,"error":"measurement not found"}]}"#)
            .create_async()
            .await;

        let err = reader(&server.url()).query("SELECT 1").await.unwrap_err();
        assert!(err.to_string().contains("measurement not found"));
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error":"authorization failed"}"#)
            .create_async()
            .await;

        let err = reader(&server.url()).query("SELECT 1").await.unwrap_err();
        assert!(err.to_string().starts_with("HTTP 401"));
    }
}
