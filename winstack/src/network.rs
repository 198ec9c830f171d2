use crate::client::{decode, decode_list};
use crate::region::Region;
use anyhow::{Context, Result};
use async_trait::async_trait;
use ipnetwork::Ipv4Network;
use ocm_common::cloudprovider::*;
use ocm_common::consts::{NETWORK_STATUS_AVAILABLE, NETWORK_TYPE_GUEST};
use serde::Deserialize;
use serde_json::json;
use std::net::Ipv4Addr;

pub(crate) const NETWORK_ALLOC_TIMEOUT_SECONDS: i64 = 300;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub sub_net_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub cidr: String,
    /// `start-end`
    #[serde(deserialize_with = "crate::de::string")]
    pub ip_range: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub gateway: String,
}

pub(crate) fn range_start(range: &str) -> String {
    range.split('-').next().unwrap_or_default().to_string()
}

pub(crate) fn range_end(range: &str) -> String {
    range.split('-').nth(1).unwrap_or_default().to_string()
}

/// Inclusive IPv4 range test; anything unparsable is outside.
pub(crate) fn range_contains(range: &str, ip: &str) -> bool {
    let parse = |s: String| s.trim().parse::<Ipv4Addr>().ok().map(u32::from);
    match (
        parse(range_start(range)),
        parse(range_end(range)),
        parse(ip.to_string()),
    ) {
        (Some(start), Some(end), Some(addr)) => start <= addr && addr <= end,
        _ => false,
    }
}

pub(crate) fn cidr_mask(cidr: &str) -> u8 {
    cidr.parse::<Ipv4Network>().map(|n| n.prefix()).unwrap_or(0)
}

/// First host address of `cidr`.
pub(crate) fn default_gateway(cidr: &str) -> Result<String> {
    let net: Ipv4Network = cidr
        .parse()
        .with_context(|| format!("Invalid cidr {}", cidr))?;
    Ok(Ipv4Addr::from(u32::from(net.network()).wrapping_add(1)).to_string())
}

impl Region {
    pub async fn get_networks(&self, vpc_id: &str) -> Result<Vec<NetworkInfo>> {
        let url = format!("/api/network/vpcs/{}/networks", vpc_id);
        let resp = self.client().get(&url, &[]).await?;
        decode_list(resp, "")
    }

    pub async fn create_network_record(
        &self,
        vpc_id: &str,
        name: &str,
        cidr: &str,
    ) -> Result<NetworkInfo> {
        let body = json!({
            "cidr": cidr,
            "gateway": default_gateway(cidr)?,
            "ipVersion": "4",
            "name": name,
        });
        let url = format!("/api/network/vpcs/{}/networks", vpc_id);
        let resp = self.client().post(&url, &body).await?;
        decode(resp, "")
    }

    pub async fn delete_network(&self, vpc_id: &str, id: &str) -> Result<()> {
        let url = format!("/api/network/vpcs/{}/networks/{}/delete", vpc_id, id);
        self.client().post(&url, &serde_json::Value::Null).await?;
        Ok(())
    }
}

/// A subnet of a VPC.
#[derive(Clone)]
pub struct Network {
    region: Region,
    vpc_id: String,
    wire_id: String,
    info: NetworkInfo,
}

impl Network {
    pub(crate) fn new(region: Region, vpc_id: &str, wire_id: &str, info: NetworkInfo) -> Self {
        Self {
            region,
            vpc_id: vpc_id.to_string(),
            wire_id: wire_id.to_string(),
            info,
        }
    }

    pub fn info(&self) -> &NetworkInfo {
        &self.info
    }

    pub fn vpc_id(&self) -> &str {
        &self.vpc_id
    }

    pub fn contains(&self, ip: &str) -> bool {
        range_contains(&self.info.ip_range, ip)
    }
}

#[async_trait]
impl CloudResource for Network {
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
impl CloudNetwork for Network {
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
        NETWORK_TYPE_GUEST.to_string()
    }

    fn public_scope(&self) -> PublicScope {
        PublicScope::Domain
    }

    async fn delete(&self) -> Result<()> {
        self.region.delete_network(&self.vpc_id, &self.info.id).await
    }

    fn alloc_timeout_seconds(&self) -> i64 {
        NETWORK_ALLOC_TIMEOUT_SECONDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mock_json, path, test_region};
    use mockito::{Matcher, Server};

    #[test]
    fn test_range_helpers() {
        assert_eq!(range_start("10.0.0.2-10.0.0.254"), "10.0.0.2");
        assert_eq!(range_end("10.0.0.2-10.0.0.254"), "10.0.0.254");
        assert_eq!(range_end("10.0.0.2"), "");
        assert!(range_contains("10.0.0.2-10.0.0.254", "10.0.0.2"));
        assert!(range_contains("10.0.0.2-10.0.0.254", "10.0.0.254"));
        assert!(!range_contains("10.0.0.2-10.0.0.254", "10.0.1.1"));
        assert!(!range_contains("", "10.0.0.5"));
        assert!(!range_contains("10.0.0.2-10.0.0.254", "not-an-ip"));
        assert_eq!(cidr_mask("192.168.10.0/24"), 24);
        assert_eq!(cidr_mask("garbage"), 0);
        assert_eq!(default_gateway("192.168.10.0/24").unwrap(), "192.168.10.1");
        assert_eq!(default_gateway("172.16.5.7/16").unwrap(), "172.16.0.1");
        assert!(default_gateway("nope").is_err());
    }

    #[tokio::test]
    async fn test_vpc_networks() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        mock_json(
            &mut server,
            "GET",
            "/api/network/vpcs/vpc-1/networks",
            r#"[{"id":"net-1","name":"","cidr":"192.168.1.0/24","ipRange":"192.168.1.2-192.168.1.254","gateway":"192.168.1.1"}]"#,
        )
        .await;
        let delete = server
            .mock("POST", "/api/network/vpcs/vpc-1/networks/net-1/delete")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let info = region.get_networks("vpc-1").await.unwrap().remove(0);
        let network = Network::new(region.clone(), "vpc-1", "vpc-1/c-1", info);
        assert_eq!(network.name(), "net-1");
        assert_eq!(network.ip_start(), "192.168.1.2");
        assert_eq!(network.ip_end(), "192.168.1.254");
        assert_eq!(network.ip_mask(), 24);
        assert_eq!(network.gateway(), "192.168.1.1");
        assert_eq!(network.server_type(), "guest");
        assert_eq!(network.wire_id(), "vpc-1/c-1");
        assert_eq!(network.alloc_timeout_seconds(), 300);
        assert!(network.contains("192.168.1.100"));
        network.delete().await.unwrap();
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_network_derives_gateway() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        let create = server
            .mock("POST", path("/api/network/vpcs/vpc-1/networks"))
            .match_body(Matcher::Json(json!({
                "cidr": "10.1.0.0/16",
                "gateway": "10.1.0.1",
                "ipVersion": "4",
                "name": "app",
            })))
            .with_status(200)
            .with_body(r#"{"id":"net-7","name":"app","cidr":"10.1.0.0/16"}"#)
            .create_async()
            .await;

        let info = region
            .create_network_record("vpc-1", "app", "10.1.0.0/16")
            .await
            .unwrap();
        assert_eq!(info.id, "net-7");
        create.assert_async().await;
    }
}
