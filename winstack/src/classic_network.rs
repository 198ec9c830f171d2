use crate::client::{decode, decode_list};
use crate::network::{
    cidr_mask, default_gateway, range_contains, range_end, range_start,
    NETWORK_ALLOC_TIMEOUT_SECONDS,
};
use crate::region::Region;
use anyhow::Result;
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::{NETWORK_STATUS_AVAILABLE, NETWORK_TYPE_EIP};
use ocm_common::CloudError;
use serde::Deserialize;
use serde_json::json;

pub(crate) const CLASSIC_NETWORK_LIST_URL: &str = "/api/network/networks/external_nets";

/// An external (provider) network.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassicNetworkInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub cidr: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub gateway: String,
    #[serde(rename = "type", deserialize_with = "crate::de::int")]
    pub kind: i64,
    #[serde(deserialize_with = "crate::de::string")]
    pub net_type: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub physical_network: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub ip_range: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub ip_version: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub create_time: String,
}

impl ClassicNetworkInfo {
    pub fn contains(&self, ip: &str) -> bool {
        range_contains(&self.ip_range, ip)
    }
}

/// Arguments of [`Region::create_classic_network`].
#[derive(Debug, Clone, Default)]
pub struct ClassicNetworkSpec<'a> {
    pub wire_name: &'a str,
    pub name: &'a str,
    pub cidr: &'a str,
    pub ip_start: &'a str,
    pub ip_end: &'a str,
    pub gateway: &'a str,
    pub vlan_id: i64,
}

impl Region {
    pub async fn classic_networks(&self) -> Result<Vec<ClassicNetworkInfo>> {
        let resp = self.client().get(CLASSIC_NETWORK_LIST_URL, &[]).await?;
        decode_list(resp, "")
    }

    pub async fn classic_network_by_id(&self, id: &str) -> Result<ClassicNetworkInfo> {
        self.classic_networks()
            .await?
            .into_iter()
            .find(|n| n.id == id)
            .ok_or_else(|| CloudError::not_found(id).into())
    }

    pub async fn create_classic_network(
        &self,
        spec: &ClassicNetworkSpec<'_>,
    ) -> Result<ClassicNetworkInfo> {
        let gateway = if spec.gateway.is_empty() {
            default_gateway(spec.cidr)?
        } else {
            spec.gateway.to_string()
        };
        let body = json!({
            "cidr": spec.cidr,
            "gateway": gateway,
            "ipVersion": "4",
            "name": spec.name,
            "netType": "vlan",
            "physicalNetwork": spec.wire_name,
            "type": "1",
            "segmentationId": spec.vlan_id,
            "ipRange": format!("{}-{}", spec.ip_start, spec.ip_end),
        });
        let resp = self.client().post(CLASSIC_NETWORK_LIST_URL, &body).await?;
        decode(resp, "")
    }

    pub async fn delete_classic_network(&self, id: &str) -> Result<()> {
        let url = format!("{}/{}/delete", CLASSIC_NETWORK_LIST_URL, id);
        self.client().post(&url, &serde_json::Value::Null).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct ClassicNetwork {
    region: Region,
    wire_id: String,
    info: ClassicNetworkInfo,
}

impl ClassicNetwork {
    pub(crate) fn new(region: Region, wire_id: &str, info: ClassicNetworkInfo) -> Self {
        Self {
            region,
            wire_id: wire_id.to_string(),
            info,
        }
    }

    pub fn info(&self) -> &ClassicNetworkInfo {
        &self.info
    }
}

#[async_trait]
impl CloudResource for ClassicNetwork {
    fn id(&self) -> String {
        self.info.id.clone()
    }

    fn name(&self) -> String {
        if self.info.name.is_empty() {
            self.info.id.clone()
        } else {
            self.info.name.clone()
        }
    }

    fn global_id(&self) -> String {
        self.info.id.clone()
    }

    fn status(&self) -> String {
        NETWORK_STATUS_AVAILABLE.to_string()
    }
}

#[async_trait]
impl CloudNetwork for ClassicNetwork {
    fn wire_id(&self) -> String {
        self.wire_id.clone()
    }

    fn ip_start(&self) -> String {
        range_start(&self.info.ip_range)
    }

    fn ip_end(&self) -> String {
        range_end(&self.info.ip_range)
    }

    fn ip_mask(&self) -> u8 {
        cidr_mask(&self.info.cidr)
    }

    fn gateway(&self) -> String {
        self.info.gateway.clone()
    }

    fn server_type(&self) -> String {
        NETWORK_TYPE_EIP.to_string()
    }

    fn public_scope(&self) -> PublicScope {
        PublicScope::Domain
    }

    async fn delete(&self) -> Result<()> {
        self.region.delete_classic_network(&self.info.id).await
    }

    fn alloc_timeout_seconds(&self) -> i64 {
        NETWORK_ALLOC_TIMEOUT_SECONDS
    }
}
