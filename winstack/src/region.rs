use crate::client::{WinStackClient, CLOUD_PROVIDER_WINSTACK};
use anyhow::Result;
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::CLOUD_REGION_STATUS_INSERVICE;
use serde::Deserialize;
use std::sync::Arc;

/// A WinStack resource pool.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegionInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
}

#[derive(Clone)]
pub struct Region {
    client: Arc<WinStackClient>,
    info: RegionInfo,
}

impl Region {
    pub(crate) fn new(client: Arc<WinStackClient>, info: RegionInfo) -> Self {
        Self { client, info }
    }

    pub fn client(&self) -> &WinStackClient {
        &self.client
    }

    pub fn info(&self) -> &RegionInfo {
        &self.info
    }
}

#[async_trait]
impl CloudResource for Region {
    fn id(&self) -> String {
        self.info.id.clone()
    }

    fn name(&self) -> String {
        self.info.name.clone()
    }

    fn global_id(&self) -> String {
        format!("{}/{}", CLOUD_PROVIDER_WINSTACK, self.info.id)
    }

    fn status(&self) -> String {
        CLOUD_REGION_STATUS_INSERVICE.to_string()
    }
}

#[async_trait]
impl CloudRegion for Region {
    fn provider(&self) -> String {
        CLOUD_PROVIDER_WINSTACK.to_string()
    }

    fn capabilities(&self) -> Vec<String> {
        self.client.capabilities()
    }

    async fn list_zones(&self) -> Result<Vec<Box<dyn CloudZone>>> {
        Ok(self
            .clusters()
            .await?
            .into_iter()
            .map(|c| Box::new(c) as Box<dyn CloudZone>)
            .collect())
    }

    async fn list_hosts(&self) -> Result<Vec<Box<dyn CloudHost>>> {
        let mut hosts = Vec::new();
        for zone in self.list_zones().await? {
            hosts.extend(zone.list_hosts().await?);
        }
        Ok(hosts)
    }

    async fn list_vpcs(&self) -> Result<Vec<Box<dyn CloudVpc>>> {
        self.all_vpcs().await
    }

    async fn create_vpc(&self, opts: &VpcCreateOptions) -> Result<Box<dyn CloudVpc>> {
        Ok(Box::new(self.create_vpc_record(&opts.name, &opts.desc).await?))
    }

    async fn list_eips(&self) -> Result<Vec<Box<dyn CloudEip>>> {
        Ok(self
            .eips()
            .await?
            .into_iter()
            .map(|e| Box::new(e) as Box<dyn CloudEip>)
            .collect())
    }

    async fn create_eip(&self, opts: &EipCreateOptions) -> Result<Box<dyn CloudEip>> {
        Ok(Box::new(self.create_eip_record(opts).await?))
    }

    async fn get_security_group(&self, id: &str) -> Result<Box<dyn CloudSecurityGroup>> {
        Ok(Box::new(self.security_group_by_global_id(id).await?))
    }

    async fn get_security_group_by_name(
        &self,
        opts: &SecurityGroupFilterOptions,
    ) -> Result<Box<dyn CloudSecurityGroup>> {
        Ok(Box::new(self.security_group_by_name(&opts.name).await?))
    }

    async fn create_security_group(
        &self,
        input: &SecurityGroupCreateInput,
    ) -> Result<Box<dyn CloudSecurityGroup>> {
        Ok(Box::new(
            self.create_security_group_record(&input.vpc_id, &input.name, &input.desc)
                .await?,
        ))
    }
}
