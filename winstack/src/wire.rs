use crate::cluster::ClusterInfo;
use crate::network::Network;
use crate::region::Region;
use crate::vpc::VpcInfo;
use anyhow::Result;
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::WIRE_STATUS_AVAILABLE;
use ocm_common::CloudError;

pub(crate) const WIRE_BANDWIDTH_MBPS: i64 = 1000;

/// The slice of a VPC that lives in one cluster.
#[derive(Clone)]
pub struct Wire {
    region: Region,
    vpc: VpcInfo,
    cluster: ClusterInfo,
}

impl Wire {
    pub(crate) fn new(region: Region, vpc: VpcInfo, cluster: ClusterInfo) -> Self {
        Self {
            region,
            vpc,
            cluster,
        }
    }

    pub fn wire_id(vpc_id: &str, cluster_id: &str) -> String {
        format!("{}/{}", vpc_id, cluster_id)
    }
}

#[async_trait]
impl CloudResource for Wire {
    fn id(&self) -> String {
        Self::wire_id(&self.vpc.id, &self.cluster.id)
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
impl CloudWire for Wire {
    fn vpc_id(&self) -> String {
        self.vpc.id.clone()
    }

    fn zone_id(&self) -> String {
        self.cluster.id.clone()
    }

    fn bandwidth(&self) -> i64 {
        WIRE_BANDWIDTH_MBPS
    }

    async fn create_network(
        &self,
        _opts: &NetworkCreateOptions,
    ) -> Result<Box<dyn CloudNetwork>> {
        Err(CloudError::not_supported("create network on a vpc wire").into())
    }

    async fn list_networks(&self) -> Result<Vec<Box<dyn CloudNetwork>>> {
        let wire_id = self.id();
        Ok(self
            .region
            .get_networks(&self.vpc.id)
            .await?
            .into_iter()
            .map(|info| {
                Box::new(Network::new(self.region.clone(), &self.vpc.id, &wire_id, info))
                    as Box<dyn CloudNetwork>
            })
            .collect())
    }
}
