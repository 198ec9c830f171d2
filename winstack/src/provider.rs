use crate::client::{WinStackClient, WinStackConfig, CLOUD_PROVIDER_WINSTACK};
use anyhow::{bail, Result};
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::CloudError;
use std::collections::HashMap;
use std::sync::Arc;

const PROVIDER_VERSION: &str = "2009-08-15";

fn require(value: &str, name: &str) -> Result<()> {
    if value.is_empty() {
        return Err(CloudError::MissingParameter(name.to_string()).into());
    }
    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WinStackProviderFactory;

#[async_trait]
impl CloudProviderFactory for WinStackProviderFactory {
    fn id(&self) -> String {
        CLOUD_PROVIDER_WINSTACK.to_string()
    }

    fn name(&self) -> String {
        CLOUD_PROVIDER_WINSTACK.to_string()
    }

    fn is_on_premise(&self) -> bool {
        true
    }

    async fn get_provider(&self, cfg: ProviderConfig) -> Result<Box<dyn CloudProvider>> {
        let config = WinStackConfig::new(&cfg.url, &cfg.account, &cfg.secret)
            .cloudprovider_config(cfg);
        let client = WinStackClient::new(config).await?;
        Ok(Box::new(WinStackProvider::new(client)))
    }

    fn get_client_rc(&self, info: &ProviderInfo) -> Result<HashMap<String, String>> {
        Ok(HashMap::from([
            ("WINSTACK_ENDPOINT".to_string(), info.url.clone()),
            ("WINSTACK_USER".to_string(), info.account.clone()),
            ("WINSTACK_PASSWORD".to_string(), info.secret.clone()),
        ]))
    }

    fn validate_change_bandwidth(&self, _instance_id: &str, _bandwidth: i64) -> Result<()> {
        bail!("changing {} bandwidth is not supported", CLOUD_PROVIDER_WINSTACK)
    }

    fn validate_create_cloudaccount_data(
        &self,
        input: &CloudaccountCredential,
    ) -> Result<Cloudaccount> {
        require(&input.username, "username")?;
        require(&input.password, "password")?;
        require(&input.auth_url, "auth_url")?;
        Ok(Cloudaccount {
            access_url: input.auth_url.clone(),
            account: input.username.clone(),
            secret: input.password.clone(),
        })
    }

    fn validate_update_cloudaccount_credential(
        &self,
        input: &CloudaccountCredential,
        _cloudaccount: &str,
    ) -> Result<Cloudaccount> {
        require(&input.username, "username")?;
        require(&input.password, "password")?;
        Ok(Cloudaccount {
            account: input.username.clone(),
            secret: input.password.clone(),
            ..Default::default()
        })
    }
}

pub struct WinStackProvider {
    client: Arc<WinStackClient>,
}

impl WinStackProvider {
    pub fn new(client: Arc<WinStackClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<WinStackClient> {
        &self.client
    }
}

#[async_trait]
impl CloudProvider for WinStackProvider {
    fn provider_name(&self) -> String {
        CLOUD_PROVIDER_WINSTACK.to_string()
    }

    fn version(&self) -> String {
        PROVIDER_VERSION.to_string()
    }

    async fn sys_info(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({}))
    }

    fn list_regions(&self) -> Vec<Box<dyn CloudRegion>> {
        self.client
            .regions()
            .into_iter()
            .map(|r| Box::new(r) as Box<dyn CloudRegion>)
            .collect()
    }

    async fn sub_accounts(&self) -> Result<Vec<SubAccount>> {
        Ok(self.client.sub_accounts())
    }

    fn account_id(&self) -> String {
        self.client.account_id()
    }

    fn capabilities(&self) -> Vec<String> {
        self.client.capabilities()
    }
}
