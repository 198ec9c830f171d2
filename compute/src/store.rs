//! Contracts for the resource store, cloud lookups and audit events.

use crate::models::{Network, ObjectRef, RouteTable, RouteTableAssociation, Vpc};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use ocm_common::cloudprovider::{CloudProvider, CloudRouteTable, CloudVpc};
use std::sync::Arc;

pub const ACT_CREATE: &str = "create";
pub const ACT_DELETE: &str = "delete";
pub const ACT_SYNC_UPDATE: &str = "sync_update";

#[async_trait]
pub trait ComputeStore: Send + Sync {
    async fn fetch_route_table(&self, id: &str) -> Result<RouteTable>;

    async fn fetch_association(&self, id: &str) -> Result<RouteTableAssociation>;

    async fn fetch_network(&self, id: &str) -> Result<Network>;

    async fn fetch_vpc(&self, id: &str) -> Result<Vpc>;

    async fn network_by_ext_id(&self, vpc_id: &str, external_id: &str) -> Result<Network>;

    async fn set_route_table_status(&self, id: &str, status: &str, reason: &str) -> Result<()>;

    async fn set_association_status(&self, id: &str, status: &str, reason: &str) -> Result<()>;

    async fn set_association_external_id(&self, id: &str, external_id: &str) -> Result<()>;

    async fn update_association(&self, assoc: &RouteTableAssociation) -> Result<()>;

    async fn count_associations(
        &self,
        route_table_id: &str,
        associated_resource_id: &str,
        association_type: &str,
    ) -> Result<usize>;

    /// Store a new association; the returned copy carries its assigned id.
    async fn insert_association(
        &self,
        assoc: RouteTableAssociation,
    ) -> Result<RouteTableAssociation>;

    async fn delete_association(&self, id: &str) -> Result<()>;

    /// Refresh the route table record from its cloud counterpart.
    async fn sync_route_table(
        &self,
        route_table_id: &str,
        vpc: &Vpc,
        cloud: &dyn CloudRouteTable,
    ) -> Result<()>;

    /// Replace the stored routes of a table with the cloud's.
    async fn sync_route_sets(&self, route_table_id: &str, cloud: &dyn CloudRouteTable)
        -> Result<()>;
}

#[async_trait]
pub trait CloudResolver: Send + Sync {
    async fn cloud_vpc(&self, vpc: &Vpc) -> Result<Box<dyn CloudVpc>>;

    async fn cloud_route_table(
        &self,
        vpc: &Vpc,
        route_table: &RouteTable,
    ) -> Result<Box<dyn CloudRouteTable>>;
}

/// Resolves records through the provider that manages them.
pub struct ProviderResolver {
    provider: Arc<dyn CloudProvider>,
}

impl ProviderResolver {
    pub fn new(provider: Arc<dyn CloudProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CloudResolver for ProviderResolver {
    async fn cloud_vpc(&self, vpc: &Vpc) -> Result<Box<dyn CloudVpc>> {
        if vpc.external_id.is_empty() {
            bail!("vpc {} has no external id", vpc.id);
        }
        let region = self
            .provider
            .get_region(&vpc.region_external_id)
            .await
            .with_context(|| format!("GetIRegionById({})", vpc.region_external_id))?;
        region
            .get_vpc(&vpc.external_id)
            .await
            .with_context(|| format!("GetIVpcById({})", vpc.external_id))
    }

    async fn cloud_route_table(
        &self,
        vpc: &Vpc,
        route_table: &RouteTable,
    ) -> Result<Box<dyn CloudRouteTable>> {
        if route_table.external_id.is_empty() {
            bail!("route table {} has no external id", route_table.id);
        }
        let ivpc = self.cloud_vpc(vpc).await?;
        ivpc.get_route_table(&route_table.external_id)
            .await
            .with_context(|| format!("GetIRouteTableById({})", route_table.external_id))
    }
}

pub trait EventSink: Send + Sync {
    fn ops_log(&self, obj: &ObjectRef, action: &str, notes: &str, user: &str);

    fn action_log(&self, obj: &ObjectRef, action: &str, notes: &str, user: &str, success: bool);

    fn event_notify(&self, obj: &ObjectRef, action: &str, user: &str);
}

/// Writes every event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn ops_log(&self, obj: &ObjectRef, action: &str, notes: &str, user: &str) {
        tracing::info!(kind = obj.kind, id = %obj.id, action, user, "ops: {}", notes);
    }

    fn action_log(&self, obj: &ObjectRef, action: &str, notes: &str, user: &str, success: bool) {
        if success {
            tracing::info!(kind = obj.kind, id = %obj.id, action, user, "action succeeded");
        } else {
            tracing::warn!(kind = obj.kind, id = %obj.id, action, user, "action failed: {}", notes);
        }
    }

    fn event_notify(&self, obj: &ObjectRef, action: &str, user: &str) {
        tracing::info!(kind = obj.kind, id = %obj.id, name = %obj.name, action, user, "event");
    }
}
