use crate::classic_network::CLASSIC_NETWORK_LIST_URL;
use crate::classic_wire::ClassicWire;
use crate::client::decode_list;
use crate::region::Region;
use anyhow::Result;
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::{VPC_EXTERNAL_ACCESS_MODE_DISTGW, VPC_STATUS_AVAILABLE};
use ocm_common::CloudError;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassicVpcInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
}

impl Region {
    /// External networks of type 1, each surfaced as a VPC of its own.
    pub async fn classic_vpc_records(&self) -> Result<Vec<ClassicVpcInfo>> {
        let query = [("type", "1".to_string())];
        let resp = self.client().get(CLASSIC_NETWORK_LIST_URL, &query).await?;
        decode_list(resp, "")
    }

    pub async fn classic_vpc_by_id(&self, id: &str) -> Result<ClassicVpcInfo> {
        self.classic_vpc_records()
            .await?
            .into_iter()
            .find(|v| v.id == id)
            .ok_or_else(|| CloudError::not_found(id).into())
    }
}

#[derive(Clone)]
pub struct ClassicVpc {
    region: Region,
    info: ClassicVpcInfo,
}

impl ClassicVpc {
    pub(crate) fn new(region: Region, info: ClassicVpcInfo) -> Self {
        Self { region, info }
    }
}

#[async_trait]
impl CloudResource for ClassicVpc {
    fn id(&self) -> String {
        self.info.id.clone()
    }

    fn name(&self) -> String {
        self.info.name.clone()
    }

    fn global_id(&self) -> String {
        self.info.id.clone()
    }

    fn status(&self) -> String {
        VPC_STATUS_AVAILABLE.to_string()
    }
}

#[async_trait]
impl CloudVpc for ClassicVpc {
    fn region_id(&self) -> String {
        self.region.id()
    }

    fn is_default(&self) -> bool {
        false
    }

    fn cidr_block(&self) -> String {
        String::new()
    }

    async fn list_security_groups(&self) -> Result<Vec<Box<dyn CloudSecurityGroup>>> {
        Ok(Vec::new())
    }

    async fn list_route_tables(&self) -> Result<Vec<Box<dyn CloudRouteTable>>> {
        Ok(Vec::new())
    }

    async fn get_route_table(&self, _id: &str) -> Result<Box<dyn CloudRouteTable>> {
        Err(CloudError::not_implemented("route tables of an external network").into())
    }

    async fn delete(&self) -> Result<()> {
        Ok(())
    }

    async fn list_wires(&self) -> Result<Vec<Box<dyn CloudWire>>> {
        Ok(self
            .region
            .get_clusters()
            .await?
            .into_iter()
            .map(|cluster| {
                Box::new(ClassicWire::new(
                    self.region.clone(),
                    self.info.clone(),
                    cluster,
                )) as Box<dyn CloudWire>
            })
            .collect())
    }

    fn external_access_mode(&self) -> String {
        VPC_EXTERNAL_ACCESS_MODE_DISTGW.to_string()
    }

    fn is_external_net(&self) -> bool {
        true
    }
}
