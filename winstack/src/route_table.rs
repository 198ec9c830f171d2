use crate::region::Region;
use crate::router::{RouteEntry, RouterInfo};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::{ROUTE_ENTRY_TYPE_CUSTOM, ROUTE_TABLE_AVAILABLE};
use ocm_common::CloudError;

#[async_trait]
impl CloudResource for RouteEntry {
    fn id(&self) -> String {
        format!("{}:{}", self.destination, self.nexthop)
    }

    fn name(&self) -> String {
        String::new()
    }

    fn global_id(&self) -> String {
        self.id()
    }

    fn status(&self) -> String {
        String::new()
    }
}

impl CloudRoute for RouteEntry {
    fn route_type(&self) -> String {
        ROUTE_ENTRY_TYPE_CUSTOM.to_string()
    }

    fn cidr(&self) -> String {
        self.destination.clone()
    }

    fn next_hop_type(&self) -> String {
        self.nexthop.clone()
    }

    fn next_hop(&self) -> String {
        self.nexthop.clone()
    }
}

/// A VPC router seen as its route table.
#[derive(Clone)]
pub struct RouteTable {
    region: Region,
    vpc_id: String,
    router: RouterInfo,
}

impl RouteTable {
    pub(crate) fn new(region: Region, vpc_id: &str, router: RouterInfo) -> Self {
        Self {
            region,
            vpc_id: vpc_id.to_string(),
            router,
        }
    }

    pub fn router(&self) -> &RouterInfo {
        &self.router
    }
}

#[async_trait]
impl CloudResource for RouteTable {
    fn id(&self) -> String {
        self.router.id.clone()
    }

    fn name(&self) -> String {
        self.router.name.clone()
    }

    fn global_id(&self) -> String {
        self.router.id.clone()
    }

    fn status(&self) -> String {
        if self.router.status == "ACTIVE" {
            ROUTE_TABLE_AVAILABLE.to_string()
        } else {
            self.router.status.clone()
        }
    }

    async fn refresh(&mut self) -> Result<()> {
        self.router = self
            .region
            .router_by_id(&self.router.id)
            .await
            .with_context(|| format!("GetRouter {}", self.router.id))?;
        Ok(())
    }
}

#[async_trait]
impl CloudRouteTable for RouteTable {
    fn region_id(&self) -> String {
        self.region.id()
    }

    fn route_table_type(&self) -> RouteTableType {
        RouteTableType::System
    }

    fn vpc_id(&self) -> String {
        self.vpc_id.clone()
    }

    async fn list_routes(&self) -> Result<Vec<Box<dyn CloudRoute>>> {
        Ok(self
            .router
            .routes
            .iter()
            .cloned()
            .map(|r| Box::new(r) as Box<dyn CloudRoute>)
            .collect())
    }

    async fn associations(&self) -> Vec<RouteTableAssociation> {
        let subnets = match self.region.router_subnets(&self.router.id).await {
            Ok(subnets) => subnets,
            Err(e) => {
                tracing::warn!("Failed to list interfaces of router {}: {:#}", self.router.id, e);
                return Vec::new();
            }
        };
        subnets
            .into_iter()
            .map(|s| RouteTableAssociation {
                association_id: format!("{}:{}", self.id(), s.network_id),
                association_type: RouteTableAssociationType::Subnet,
                associated_resource_id: s.network_id,
            })
            .collect()
    }

    async fn create_route(&self, _route: &RouteSet) -> Result<()> {
        Err(CloudError::not_supported("create_route").into())
    }

    async fn update_route(&self, _route: &RouteSet) -> Result<()> {
        Err(CloudError::not_supported("update_route").into())
    }

    async fn remove_route(&self, _route: &RouteSet) -> Result<()> {
        Err(CloudError::not_supported("remove_route").into())
    }

    async fn add_route_interface(&self, iface: &RouteInterface) -> Result<()> {
        self.region
            .add_router_interface(&self.router.id, &iface.network_id)
            .await
    }

    async fn create_association(&self, assoc: &RouteTableAssociation) -> Result<()> {
        match assoc.association_type {
            RouteTableAssociationType::Subnet => {
                self.add_route_interface(&RouteInterface {
                    network_id: assoc.associated_resource_id.clone(),
                })
                .await
            }
            RouteTableAssociationType::Router => {
                Err(CloudError::not_supported("router association").into())
            }
        }
    }

    async fn delete(&self) -> Result<()> {
        self.region.delete_router(&self.router.id).await
    }
}
