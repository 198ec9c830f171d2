use crate::region::{Region, RegionInfo};
use anyhow::{bail, Context, Result};
use ocm_common::cloudprovider::{CloudResource, ProviderConfig, SubAccount};
use ocm_common::consts::*;
use ocm_common::CloudError;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub const CLOUD_PROVIDER_WINSTACK: &str = "WinStack";
pub const HYPERVISOR_WINSTACK: &str = "winstack";

const CHECK_SESSION_URL: &str = "/api/check/session";
const LOGIN_URL: &str = "/api/login";
const REGION_LIST_URL: &str = "/api/compute/pools";

/// Default page size for list endpoints; a short page ends the listing.
pub const PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Default)]
pub struct WinStackConfig {
    pub endpoint: String,
    pub user: String,
    pub password: String,
    pub debug: bool,
    pub accept_invalid_certs: bool,
    pub provider: ProviderConfig,
}

impl WinStackConfig {
    pub fn new(endpoint: &str, user: &str, password: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    pub fn cloudprovider_config(mut self, cfg: ProviderConfig) -> Self {
        self.provider = cfg;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Private installations usually ship self-signed certificates.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

/// Error body returned by the WinStack API alongside a 2xx or 4xx status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WinStackError {
    #[serde(rename = "errorCode", default, deserialize_with = "crate::de::int")]
    pub error_code: i64,
    #[serde(default, deserialize_with = "crate::de::string")]
    pub message: String,
    #[serde(default, deserialize_with = "crate::de::string")]
    pub exception: String,
}

impl WinStackError {
    fn from_body(body: &Value) -> Option<Self> {
        if !body.is_object() {
            return None;
        }
        let err: WinStackError = serde_json::from_value(body.clone()).ok()?;
        (!err.message.is_empty()).then_some(err)
    }
}

impl std::fmt::Display for WinStackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{}: {}", self.error_code, self.message),
        }
    }
}

impl std::error::Error for WinStackError {}

/// Query parameters for a paged list endpoint.
#[derive(Debug, Clone)]
pub struct PageQuery {
    filters: Vec<(&'static str, String)>,
    start: i64,
    size: i64,
}

impl PageQuery {
    pub fn new(start: i64, size: i64) -> Self {
        Self {
            filters: Vec::new(),
            start: start.max(0),
            size: if size <= 0 { PAGE_SIZE } else { size },
        }
    }

    /// Adds `key=value` unless the value is empty.
    pub fn filter(mut self, key: &'static str, value: &str) -> Self {
        if !value.is_empty() {
            self.filters.push((key, value.to_string()));
        }
        self
    }

    /// Like [`PageQuery::filter`], but an exact-id lookup always reads from the first row.
    pub fn id(mut self, key: &'static str, value: &str) -> Self {
        if !value.is_empty() {
            self.start = 0;
            self.filters.push((key, value.to_string()));
        }
        self
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = self.filters.clone();
        params.push(("start", self.start.to_string()));
        params.push(("size", self.size.to_string()));
        params
    }
}

/// Walk a paged endpoint from page 1 until a page comes back short.
pub async fn paginate<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(i64, i64) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let size = PAGE_SIZE;
    let mut start = 1;
    let mut all = Vec::new();
    loop {
        let page = fetch(start, size).await?;
        let count = page.len() as i64;
        all.extend(page);
        if count < size {
            break;
        }
        start += 1;
    }
    Ok(all)
}

/// Decode `body[key]` (or the whole body when `key` is empty).
pub(crate) fn decode<T: DeserializeOwned>(mut body: Value, key: &str) -> Result<T> {
    let inner = if key.is_empty() {
        body
    } else {
        body.get_mut(key).map(Value::take).unwrap_or(Value::Null)
    };
    serde_json::from_value(inner).with_context(|| format!("Failed to decode '{}'", key))
}

/// Decode a list, treating a missing or null key as empty. A bare array
/// body is accepted when `key` is empty, as is a `data` envelope.
pub(crate) fn decode_list<T: DeserializeOwned>(body: Value, key: &str) -> Result<Vec<T>> {
    let inner = match (key.is_empty(), body) {
        (true, Value::Object(mut map)) => map.remove("data").unwrap_or(Value::Null),
        (true, other) => other,
        (false, mut other) => other.get_mut(key).map(Value::take).unwrap_or(Value::Null),
    };
    if inner.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(inner).with_context(|| format!("Failed to decode list '{}'", key))
}

pub struct WinStackClient {
    config: WinStackConfig,
    http: Client,
    session: RwLock<Option<String>>,
    regions: Vec<RegionInfo>,
}

impl WinStackClient {
    /// Connect and load the region (pool) list.
    pub async fn new(config: WinStackConfig) -> Result<Arc<Self>> {
        let http = Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        let mut client = Self {
            config,
            http,
            session: RwLock::new(None),
            regions: Vec::new(),
        };
        client.regions = client.fetch_regions().await?;
        tracing::info!(
            "Connected to WinStack at {} ({} regions)",
            client.config.endpoint,
            client.regions.len()
        );
        Ok(Arc::new(client))
    }

    pub fn config(&self) -> &WinStackConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &str {
        self.config.endpoint.trim_end_matches('/')
    }

    pub fn account_id(&self) -> String {
        self.config.endpoint.clone()
    }

    async fn fetch_regions(&self) -> Result<Vec<RegionInfo>> {
        let resp = self.get(REGION_LIST_URL, &[]).await?;
        decode_list(resp, "data")
    }

    pub fn regions(self: &Arc<Self>) -> Vec<Region> {
        self.regions
            .iter()
            .map(|info| Region::new(self.clone(), info.clone()))
            .collect()
    }

    /// Region by id; an empty id selects the first region.
    pub fn get_region(self: &Arc<Self>, id: &str) -> Result<Region> {
        let found = self
            .regions
            .iter()
            .find(|r| r.id == id)
            .or_else(|| if id.is_empty() { self.regions.first() } else { None });
        match found {
            Some(info) => Ok(Region::new(self.clone(), info.clone())),
            None => Err(CloudError::not_found(format!("region {}", id)).into()),
        }
    }

    pub fn get_region_by_global_id(self: &Arc<Self>, id: &str) -> Result<Region> {
        self.regions()
            .into_iter()
            .find(|r| r.global_id() == id)
            .ok_or_else(|| CloudError::not_found(id).into())
    }

    pub fn capabilities(&self) -> Vec<String> {
        [
            CLOUD_CAPABILITY_PROJECT,
            CLOUD_CAPABILITY_COMPUTE,
            CLOUD_CAPABILITY_NETWORK,
            CLOUD_CAPABILITY_EIP,
            CLOUD_CAPABILITY_LOADBALANCER,
            CLOUD_CAPABILITY_OBJECTSTORE,
            CLOUD_CAPABILITY_RDS,
            CLOUD_CAPABILITY_CACHE,
            CLOUD_CAPABILITY_EVENT,
            CLOUD_CAPABILITY_CLOUDID,
            CLOUD_CAPABILITY_DNSZONE,
            CLOUD_CAPABILITY_INTERVPCNETWORK,
            CLOUD_CAPABILITY_SAML_AUTH,
            CLOUD_CAPABILITY_NAT,
            CLOUD_CAPABILITY_NAS,
            CLOUD_CAPABILITY_WAF,
        ]
        .iter()
        .map(|c| c.to_string())
        .collect()
    }

    pub fn sub_accounts(&self) -> Vec<SubAccount> {
        vec![SubAccount {
            account: self.config.user.clone(),
            name: self.config.provider.name.clone(),
            health_status: CLOUD_PROVIDER_HEALTH_NORMAL.to_string(),
        }]
    }

    fn skip_session_check(path: &str) -> bool {
        path == LOGIN_URL || path == CHECK_SESSION_URL
    }

    async fn check_session(&self) -> bool {
        self.send(Method::GET, CHECK_SESSION_URL, &[], None)
            .await
            .is_ok()
    }

    async fn refresh_session(&self) -> Result<()> {
        let body = json!({ "user": self.config.user, "pwd": self.config.password });
        let resp = self
            .send(Method::POST, LOGIN_URL, &[], Some(&body))
            .await
            .context("WinStack login failed")?;
        if let Some(session_id) = resp.get("sessionId").and_then(Value::as_str) {
            *self.session.write().await = Some(format!("SESSION={}", session_id));
            tracing::debug!("WinStack session refreshed");
        }
        Ok(())
    }

    async fn ensure_session(&self, path: &str) -> Result<()> {
        if Self::skip_session_check(path) || self.check_session().await {
            return Ok(());
        }
        tracing::debug!("Session check failed before {}, logging in", path);
        self.refresh_session().await
    }

    /// Send one request after making sure the session is live.
    pub async fn invoke(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        self.ensure_session(path).await?;
        self.send(method, path, query, body).await
    }

    /// Turn the body into JSON, mapping 401 and vendor error bodies to
    /// errors. An empty body yields `Value::Null`.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.endpoint(), path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(cookie) = self.session.read().await.as_deref() {
            request = request.header(COOKIE, cookie);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!("{} {}", method, path);
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed {} {}", method, path))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(CloudError::Unauthorized(CLOUD_PROVIDER_WINSTACK.to_string()).into());
        }
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read {} {} response", method, path))?;

        if !status.is_success() {
            if let Some(err) = serde_json::from_str::<Value>(&text)
                .ok()
                .as_ref()
                .and_then(WinStackError::from_body)
            {
                return Err(err.into());
            }
            bail!("{} {} failed ({}): {}", method, path, status, text);
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        let obj: Value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {} {} response", method, path))?;
        if self.config.debug {
            tracing::debug!(
                "response: {}",
                serde_json::to_string_pretty(&obj).unwrap_or_default()
            );
        }
        if let Some(err) = WinStackError::from_body(&obj) {
            return Err(err.into());
        }
        Ok(obj)
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        self.invoke(Method::GET, path, query, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.invoke(Method::POST, path, &[], Some(body)).await
    }

    /// The vendor's update endpoints accept POST only.
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.invoke(Method::POST, path, &[], Some(body)).await
    }

    pub async fn patch(&self, path: &str) -> Result<Value> {
        self.invoke(Method::PATCH, path, &[], None).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.invoke(Method::DELETE, path, &[], None).await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
