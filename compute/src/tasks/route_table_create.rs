use super::{TaskDeps, POLL_INTERVAL, ROUTE_TABLE_CREATE_TASK, ROUTE_TABLE_READY_TIMEOUT};
use crate::models::{RouteTable, Vpc};
use crate::store::ACT_CREATE;
use crate::taskman::{failed_stage, failure_reason, Task, TaskEngine, TaskHandler};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::FutureExt;
use ocm_common::cloudprovider::{CloudVpc, RouteSet, RouteTableCreateOptions};
use ocm_common::consts::{ROUTE_TABLE_AVAILABLE, ROUTE_TABLE_CREATE_FAILED, ROUTE_TABLE_PENDING};
use ocm_common::wait_status;
use serde_json::Value;
use std::sync::Arc;

const STAGE_COMPLETE: &str = "OnCreateRouteTableComplete";

/// Creates the cloud route table for a pending record, replaces its routes
/// with the requested ones and syncs the result back.
pub struct RouteTableCreateTask {
    deps: TaskDeps,
}

impl RouteTableCreateTask {
    pub fn new(deps: TaskDeps) -> Self {
        Self { deps }
    }

    async fn task_failed(
        &self,
        engine: &dyn TaskEngine,
        task: &Task,
        table: &RouteTable,
        reason: &str,
    ) -> Result<()> {
        tracing::warn!("Creating route table {} failed: {}", table.id, reason);
        if let Err(e) = self
            .deps
            .store
            .set_route_table_status(&table.id, ROUTE_TABLE_CREATE_FAILED, reason)
            .await
        {
            tracing::error!("Failed to mark route table {} failed: {:#}", table.id, e);
        }
        let obj = table.object_ref();
        self.deps.events.ops_log(&obj, ACT_CREATE, reason, &task.user);
        self.deps
            .events
            .action_log(&obj, ACT_CREATE, reason, &task.user, false);
        engine.set_stage_failed(&task.id, reason).await
    }

    async fn on_complete(&self, engine: &dyn TaskEngine, task: &Task, table: &RouteTable) -> Result<()> {
        let obj = table.object_ref();
        self.deps
            .events
            .action_log(&obj, ACT_CREATE, "", &task.user, true);
        self.deps.events.event_notify(&obj, ACT_CREATE, &task.user);
        engine.set_stage_complete(&task.id, Value::Null).await
    }
}

async fn create_route_table(
    deps: TaskDeps,
    table: RouteTable,
    vpc: Vpc,
    ivpc: Box<dyn CloudVpc>,
) -> Result<Value> {
    let network = deps
        .store
        .fetch_network(&table.network_id)
        .await
        .context("GetNetworkManager")?;
    let opts = RouteTableCreateOptions {
        name: table.name.clone(),
        vpc_id: vpc.external_id.clone(),
        network_id: network.external_id.clone(),
        ..Default::default()
    };
    let mut irt = ivpc
        .create_route_table(&opts)
        .await
        .context("CreateIRouteTable")?;
    wait_status(
        irt.as_mut(),
        ROUTE_TABLE_AVAILABLE,
        POLL_INTERVAL,
        ROUTE_TABLE_READY_TIMEOUT,
    )
    .await
    .context("cloudprovider.WaitStatus")?;

    // Routes the backend added on its own are replaced by the requested ones.
    let existing = irt.list_routes().await.unwrap_or_default();
    for route in &existing {
        let set = RouteSet {
            destination: route.cidr(),
            next_hop_type: route.next_hop_type(),
            next_hop: route.next_hop(),
            ..Default::default()
        };
        if let Err(e) = irt.remove_route(&set).await {
            tracing::debug!("Failed to remove route {} from {}: {:#}", set.destination, irt.global_id(), e);
        }
    }
    for route in &table.routes {
        let set = RouteSet {
            destination: route.cidr.clone(),
            next_hop_type: route.next_hop_type.clone(),
            next_hop: route.next_hop_id.clone(),
            ..Default::default()
        };
        if let Err(e) = irt.create_route(&set).await {
            tracing::debug!("Failed to add route {} to {}: {:#}", set.destination, irt.global_id(), e);
        }
    }

    let fresh = ivpc
        .get_route_table(&irt.global_id())
        .await
        .context("GetRouteTable")?;
    deps.store
        .sync_route_table(&table.id, &vpc, fresh.as_ref())
        .await
        .context("SyncWithCloudRouteTable")?;
    deps.store
        .sync_route_sets(&table.id, fresh.as_ref())
        .await
        .context("SyncRouteTableRouteSets")?;
    Ok(Value::Null)
}

#[async_trait]
impl TaskHandler for RouteTableCreateTask {
    fn name(&self) -> &'static str {
        ROUTE_TABLE_CREATE_TASK
    }

    async fn on_init(&self, engine: Arc<dyn TaskEngine>, task: &Task) -> Result<()> {
        let store = &self.deps.store;
        let table = store.fetch_route_table(&task.obj_id).await?;
        store
            .set_route_table_status(&table.id, ROUTE_TABLE_PENDING, "")
            .await?;

        let vpc = match store.fetch_vpc(&table.vpc_id).await.context("GetVpc") {
            Ok(vpc) => vpc,
            Err(e) => return self.task_failed(engine.as_ref(), task, &table, &format!("{:#}", e)).await,
        };
        let ivpc = match self.deps.resolver.cloud_vpc(&vpc).await.context("GetIVpc") {
            Ok(ivpc) => ivpc,
            Err(e) => return self.task_failed(engine.as_ref(), task, &table, &format!("{:#}", e)).await,
        };

        engine.set_stage(&task.id, STAGE_COMPLETE).await?;
        let work = create_route_table(self.deps.clone(), table, vpc, ivpc).boxed();
        engine.local_task_run(&task.id, work).await
    }

    async fn on_stage(
        &self,
        engine: Arc<dyn TaskEngine>,
        task: &Task,
        stage: &str,
        data: Value,
    ) -> Result<()> {
        let table = self.deps.store.fetch_route_table(&task.obj_id).await?;
        if stage == STAGE_COMPLETE {
            self.on_complete(engine.as_ref(), task, &table).await
        } else if stage == failed_stage(STAGE_COMPLETE) {
            self.task_failed(engine.as_ref(), task, &table, &failure_reason(&data))
                .await
        } else {
            bail!("{} has no stage {}", ROUTE_TABLE_CREATE_TASK, stage)
        }
    }
}
