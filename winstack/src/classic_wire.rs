use crate::classic_network::{ClassicNetwork, ClassicNetworkSpec};
use crate::classic_vpc::ClassicVpcInfo;
use crate::cluster::ClusterInfo;
use crate::region::Region;
use crate::wire::{Wire, WIRE_BANDWIDTH_MBPS};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::WIRE_STATUS_AVAILABLE;

/// Physical network of an external net inside one cluster.
#[derive(Clone)]
pub struct ClassicWire {
    region: Region,
    vpc: ClassicVpcInfo,
    cluster: ClusterInfo,
}

impl ClassicWire {
    pub(crate) fn new(region: Region, vpc: ClassicVpcInfo, cluster: ClusterInfo) -> Self {
        Self {
            region,
            vpc,
            cluster,
        }
    }
}

#[async_trait]
impl CloudResource for ClassicWire {
    fn id(&self) -> String {
        Wire::wire_id(&self.vpc.id, &self.cluster.id)
    }

    fn name(&self) -> String {
        format!("{}-{}", self.vpc.name, self.cluster.name)
    }

    fn global_id(&self) -> String {
        self.id()
    }

    fn status(&self) -> String {
        WIRE_STATUS_AVAILABLE.to_string()
    }
}

#[async_trait]
impl CloudWire for ClassicWire {
    fn vpc_id(&self) -> String {
        self.vpc.id.clone()
    }

    fn zone_id(&self) -> String {
        self.cluster.id.clone()
    }

    fn bandwidth(&self) -> i64 {
        WIRE_BANDWIDTH_MBPS
    }

    async fn create_network(&self, opts: &NetworkCreateOptions) -> Result<Box<dyn CloudNetwork>> {
        let wire_name = self.name();
        let info = self
            .region
            .create_classic_network(&ClassicNetworkSpec {
                wire_name: &wire_name,
                name: &opts.name,
                cidr: &opts.cidr,
                ip_start: &opts.ip_start,
                ip_end: &opts.ip_end,
                gateway: &opts.default_gateway,
                vlan_id: opts.vlan_id,
            })
            .await
            .with_context(|| format!("CreateClassicNetwork {}", opts.name))?;
        Ok(Box::new(ClassicNetwork::new(
            self.region.clone(),
            &self.id(),
            info,
        )))
    }

    async fn list_networks(&self) -> Result<Vec<Box<dyn CloudNetwork>>> {
        let wire_id = self.id();
        Ok(self
            .region
            .classic_networks()
            .await?
            .into_iter()
            .map(|info| {
                Box::new(ClassicNetwork::new(self.region.clone(), &wire_id, info))
                    as Box<dyn CloudNetwork>
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mock_json, path, test_region};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn wire(region: Region) -> ClassicWire {
        ClassicWire::new(
            region,
            ClassicVpcInfo {
                id: "ext-1".to_string(),
                name: "public".to_string(),
            },
            ClusterInfo {
                id: "c-1".to_string(),
                name: "east".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_classic_wire_lists_external_networks() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        mock_json(
            &mut server,
            "GET",
            "/api/network/networks/external_nets",
            r#"[{"id":"ext-net-1","name":"public-a","ipRange":"203.0.113.10-203.0.113.20"}]"#,
        )
        .await;

        let wire = wire(region);
        assert_eq!(wire.global_id(), "ext-1/c-1");
        let networks = wire.list_networks().await.unwrap();
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].server_type(), "eip");
        assert_eq!(networks[0].wire_id(), "ext-1/c-1");
    }

    #[tokio::test]
    async fn test_classic_wire_creates_network_on_its_physical_network() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        let create = server
            .mock("POST", path("/api/network/networks/external_nets"))
            .match_body(Matcher::PartialJson(json!({
                "physicalNetwork": "public-east",
                "gateway": "198.51.100.254",
                "segmentationId": 7,
                "ipRange": "198.51.100.10-198.51.100.20",
            })))
            .with_status(200)
            .with_body(r#"{"id":"ext-net-5","name":"dmz"}"#)
            .create_async()
            .await;

        let network = wire(region)
            .create_network(&NetworkCreateOptions {
                name: "dmz".to_string(),
                cidr: "198.51.100.0/24".to_string(),
                ip_start: "198.51.100.10".to_string(),
                ip_end: "198.51.100.20".to_string(),
                default_gateway: "198.51.100.254".to_string(),
                vlan_id: 7,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(network.global_id(), "ext-net-5");
        create.assert_async().await;
    }
}
