use crate::classic_wire::ClassicWire;
use crate::client::decode_list;
use crate::host::Host;
use crate::network::Network;
use crate::region::Region;
use crate::storage::Storage;
use crate::wire::Wire;
use anyhow::{Context, Result};
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::ZONE_ENABLE;
use ocm_common::CloudError;
use serde::Deserialize;

const CLUSTER_LIST_URL: &str = "/api/compute/clusters";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClusterInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
}

/// A compute cluster, exposed as a zone.
#[derive(Clone)]
pub struct Cluster {
    region: Region,
    info: ClusterInfo,
}

impl Region {
    pub async fn get_clusters(&self) -> Result<Vec<ClusterInfo>> {
        let resp = self.client().get(CLUSTER_LIST_URL, &[]).await?;
        decode_list(resp, "data")
    }

    pub async fn clusters(&self) -> Result<Vec<Cluster>> {
        let clusters = self.get_clusters().await.context("GetClusters")?;
        Ok(clusters
            .into_iter()
            .map(|info| Cluster::new(self.clone(), info))
            .collect())
    }
}

impl Cluster {
    pub(crate) fn new(region: Region, info: ClusterInfo) -> Self {
        Self { region, info }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn info(&self) -> &ClusterInfo {
        &self.info
    }

    pub(crate) async fn storage_by_id(&self, id: &str) -> Result<Storage> {
        self.region
            .storages()
            .await?
            .into_iter()
            .find(|s| s.id == id)
            .map(|info| Storage::new(self.region.clone(), &self.info.id, info))
            .ok_or_else(|| CloudError::not_found(id).into())
    }

    /// Subnet lookup across every VPC of the region.
    pub(crate) async fn network_by_id(&self, id: &str) -> Result<Option<Network>> {
        for vpc in self.region.vpc_records().await? {
            let networks = self.region.get_networks(&vpc.id).await?;
            if let Some(info) = networks.into_iter().find(|n| n.id == id) {
                let wire_id = Wire::wire_id(&vpc.id, &self.info.id);
                return Ok(Some(Network::new(self.region.clone(), &vpc.id, &wire_id, info)));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl CloudResource for Cluster {
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
        ZONE_ENABLE.to_string()
    }
}

#[async_trait]
impl CloudZone for Cluster {
    async fn list_hosts(&self) -> Result<Vec<Box<dyn CloudHost>>> {
        let hosts = self.region.hosts(&self.info.id, "").await?;
        Ok(hosts
            .into_iter()
            .map(|info| Box::new(Host::new(self.clone(), info)) as Box<dyn CloudHost>)
            .collect())
    }

    async fn get_host(&self, id: &str) -> Result<Box<dyn CloudHost>> {
        self.region
            .hosts(&self.info.id, id)
            .await?
            .into_iter()
            .find(|h| h.id == id)
            .map(|info| Box::new(Host::new(self.clone(), info)) as Box<dyn CloudHost>)
            .ok_or_else(|| CloudError::not_found(id).into())
    }

    async fn list_storages(&self) -> Result<Vec<Box<dyn CloudStorage>>> {
        Ok(self
            .region
            .storages()
            .await?
            .into_iter()
            .map(|info| {
                Box::new(Storage::new(self.region.clone(), &self.info.id, info))
                    as Box<dyn CloudStorage>
            })
            .collect())
    }

    async fn get_storage(&self, id: &str) -> Result<Box<dyn CloudStorage>> {
        Ok(Box::new(self.storage_by_id(id).await?))
    }

    async fn list_wires(&self) -> Result<Vec<Box<dyn CloudWire>>> {
        let mut wires: Vec<Box<dyn CloudWire>> = Vec::new();
        for vpc in self.region.vpc_records().await? {
            wires.push(Box::new(Wire::new(self.region.clone(), vpc, self.info.clone())));
        }
        for vpc in self.region.classic_vpc_records().await? {
            wires.push(Box::new(ClassicWire::new(
                self.region.clone(),
                vpc,
                self.info.clone(),
            )));
        }
        Ok(wires)
    }
}
