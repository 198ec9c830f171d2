use crate::client::{decode, decode_list};
use crate::region::Region;
use anyhow::{Context, Result};
use ocm_common::CloudError;
use serde::Deserialize;
use serde_json::json;

const ROUTER_LIST_URL: &str = "/api/sdn/v2.0/routers";

/// One static route of a router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouteEntry {
    #[serde(deserialize_with = "crate::de::string")]
    pub destination: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub nexthop: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FixedIp {
    #[serde(deserialize_with = "crate::de::string")]
    pub ip_address: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub subnet_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExternalGatewayInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub network_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub port_name: String,
    pub external_fixed_ips: Vec<FixedIp>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouterInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub status: String,
    pub routes: Vec<RouteEntry>,
    /// Owning VPC.
    #[serde(rename = "project_Id", alias = "project_id", deserialize_with = "crate::de::string")]
    pub project_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub tenant_id: String,
    pub external_gateway_info: Option<ExternalGatewayInfo>,
    #[serde(deserialize_with = "crate::de::flag")]
    pub admin_state_up: bool,
    #[serde(rename = "createTime", deserialize_with = "crate::de::string")]
    pub create_time: String,
}

/// A subnet plugged into a router.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouterSubnet {
    #[serde(
        rename = "network_id",
        alias = "networkId",
        alias = "NetworkId",
        deserialize_with = "crate::de::string"
    )]
    pub network_id: String,
}

impl Region {
    pub async fn routers(&self) -> Result<Vec<RouterInfo>> {
        let resp = self.client().get(ROUTER_LIST_URL, &[]).await?;
        decode_list(resp, "routers")
    }

    pub async fn router_by_id(&self, id: &str) -> Result<RouterInfo> {
        self.routers()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| CloudError::not_found(id).into())
    }

    pub async fn router_subnets(&self, router_id: &str) -> Result<Vec<RouterSubnet>> {
        let url = format!("{}/{}/interfaces", ROUTER_LIST_URL, router_id);
        let resp = self.client().get(&url, &[]).await?;
        decode_list(resp, "subnets")
    }

    pub async fn create_router(
        &self,
        vpc_id: &str,
        name: &str,
        network_id: &str,
    ) -> Result<RouterInfo> {
        let url = format!("/api/network/vpcs/{}/routers", vpc_id);
        let body = json!({ "name": name, "network_id": network_id });
        let resp = self
            .client()
            .post(&url, &body)
            .await
            .with_context(|| format!("CreateRouter {} in vpc {}", name, vpc_id))?;
        decode(resp, "")
    }

    pub async fn add_router_interface(&self, router_id: &str, network_id: &str) -> Result<()> {
        let url = format!("{}/{}/add_router_interface", ROUTER_LIST_URL, router_id);
        self.client()
            .put(&url, &json!({ "project_Id": network_id }))
            .await?;
        Ok(())
    }

    pub async fn delete_router(&self, id: &str) -> Result<()> {
        let url = format!("{}/{}", ROUTER_LIST_URL, id);
        self.client().delete(&url).await?;
        Ok(())
    }
}
