use crate::client::decode_list;
use crate::region::Region;
use anyhow::Result;
use async_trait::async_trait;
use ocm_common::cloudprovider::CloudNic;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NicVpc {
    #[serde(deserialize_with = "crate::de::string")]
    pub vpc_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub vpc_name: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub private_net_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub private_net_name: String,
    pub security_group_names: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NicAddress {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub net_gateway: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub net_mask: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub ip_address: String,
}

/// A bridge interface of a domain.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceNic {
    #[serde(deserialize_with = "crate::de::string")]
    pub bridge: String,
    #[serde(deserialize_with = "crate::de::flag")]
    pub is_enabled: bool,
    #[serde(deserialize_with = "crate::de::int")]
    pub model: i64,
    #[serde(deserialize_with = "crate::de::string")]
    pub mac: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub ip: String,
    #[serde(deserialize_with = "crate::de::int")]
    pub network_type: i64,
    #[serde(deserialize_with = "crate::de::string")]
    pub interface_id: String,
    pub vpc: NicVpc,
    pub net_work_list: Vec<NicAddress>,
}

impl Region {
    pub async fn instance_nics(&self, instance_id: &str) -> Result<Vec<InstanceNic>> {
        let url = format!("/api/compute/domains/{}/domainInterfaceInfo", instance_id);
        let resp = self.client().get(&url, &[]).await?;
        decode_list(resp, "bridgeInterfaces")
    }
}

#[async_trait]
impl CloudNic for InstanceNic {
    fn id(&self) -> String {
        self.interface_id.clone()
    }

    fn ip(&self) -> String {
        self.ip.clone()
    }

    fn mac(&self) -> String {
        self.mac.clone()
    }

    fn driver(&self) -> String {
        match self.model {
            2 => "rtl8139",
            3 => "e1000",
            _ => "virtio",
        }
        .to_string()
    }

    fn network_id(&self) -> String {
        self.vpc.private_net_id.clone()
    }

    async fn sub_addresses(&self) -> Result<Vec<String>> {
        Ok(self
            .net_work_list
            .iter()
            .map(|n| n.ip_address.clone())
            .collect())
    }
}
