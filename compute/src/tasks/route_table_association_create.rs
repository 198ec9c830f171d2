use super::{
    TaskDeps, ASSOCIATION_READY_TIMEOUT, POLL_INTERVAL, ROUTE_TABLE_ASSOCIATION_CREATE_TASK,
};
use crate::models::RouteTableAssociation;
use crate::store::ACT_CREATE;
use crate::taskman::{failed_stage, failure_reason, Task, TaskEngine, TaskHandler};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::FutureExt;
use ocm_common::cloudprovider::{self as cloud, CloudRouteTable};
use ocm_common::consts::{
    ROUTE_TABLE_ASSOCIATION_AVAILABLE, ROUTE_TABLE_ASSOCIATION_CREATE_FAILED,
    ROUTE_TABLE_ASSOCIATION_PENDING,
};
use ocm_common::wait_created;
use serde_json::Value;
use std::sync::Arc;

const STAGE_COMPLETE: &str = "OnCreateRouteTableAssociationComplete";

/// Binds a subnet or router to a cloud route table and records the
/// association id the cloud assigned.
pub struct RouteTableAssociationCreateTask {
    deps: TaskDeps,
}

impl RouteTableAssociationCreateTask {
    pub fn new(deps: TaskDeps) -> Self {
        Self { deps }
    }

    async fn task_failed(
        &self,
        engine: &dyn TaskEngine,
        task: &Task,
        assoc: &RouteTableAssociation,
        reason: &str,
    ) -> Result<()> {
        tracing::warn!("Creating route table association {} failed: {}", assoc.id, reason);
        if let Err(e) = self
            .deps
            .store
            .set_association_status(&assoc.id, ROUTE_TABLE_ASSOCIATION_CREATE_FAILED, reason)
            .await
        {
            tracing::error!("Failed to mark association {} failed: {:#}", assoc.id, e);
        }
        let obj = assoc.object_ref();
        self.deps.events.ops_log(&obj, ACT_CREATE, reason, &task.user);
        self.deps
            .events
            .action_log(&obj, ACT_CREATE, reason, &task.user, false);
        engine.set_stage_failed(&task.id, reason).await
    }

    async fn resolve(&self, assoc: &RouteTableAssociation) -> Result<Box<dyn CloudRouteTable>> {
        let table = self
            .deps
            .store
            .fetch_route_table(&assoc.route_table_id)
            .await
            .context("GetRouteTable")?;
        tracing::debug!("Association {} targets route table {}", assoc.id, table.id);
        let vpc = self
            .deps
            .store
            .fetch_vpc(&table.vpc_id)
            .await
            .context("GetIRouteTable")?;
        self.deps
            .resolver
            .cloud_route_table(&vpc, &table)
            .await
            .context("GetIRouteTable")
    }
}

async fn create_association(
    deps: TaskDeps,
    assoc: RouteTableAssociation,
    irt: Box<dyn CloudRouteTable>,
) -> Result<Value> {
    let kind = assoc.kind().context("CreateAssociations")?;
    let request = cloud::RouteTableAssociation {
        association_id: String::new(),
        association_type: kind,
        associated_resource_id: assoc.ext_associated_resource_id.clone(),
    };
    irt.create_association(&request)
        .await
        .context("CreateAssociations")?;

    let table: &dyn CloudRouteTable = irt.as_ref();
    let resource_id = assoc.ext_associated_resource_id.clone();
    let created = wait_created(POLL_INTERVAL, ASSOCIATION_READY_TIMEOUT, move || {
        let resource_id = resource_id.clone();
        async move {
            table
                .associations()
                .await
                .into_iter()
                .find(|a| a.associated_resource_id == resource_id)
        }
    })
    .await
    .context("CreateAssociations")?;

    deps.store
        .set_association_external_id(&assoc.id, created.global_id())
        .await?;
    deps.store
        .set_association_status(&assoc.id, ROUTE_TABLE_ASSOCIATION_AVAILABLE, "")
        .await?;
    Ok(Value::Null)
}

#[async_trait]
impl TaskHandler for RouteTableAssociationCreateTask {
    fn name(&self) -> &'static str {
        ROUTE_TABLE_ASSOCIATION_CREATE_TASK
    }

    async fn on_init(&self, engine: Arc<dyn TaskEngine>, task: &Task) -> Result<()> {
        let assoc = self.deps.store.fetch_association(&task.obj_id).await?;
        self.deps
            .store
            .set_association_status(&assoc.id, ROUTE_TABLE_ASSOCIATION_PENDING, "")
            .await?;

        let irt = match self.resolve(&assoc).await {
            Ok(irt) => irt,
            Err(e) => {
                return self
                    .task_failed(engine.as_ref(), task, &assoc, &format!("{:#}", e))
                    .await
            }
        };

        engine.set_stage(&task.id, STAGE_COMPLETE).await?;
        let work = create_association(self.deps.clone(), assoc, irt).boxed();
        engine.local_task_run(&task.id, work).await
    }

    async fn on_stage(
        &self,
        engine: Arc<dyn TaskEngine>,
        task: &Task,
        stage: &str,
        data: Value,
    ) -> Result<()> {
        let assoc = self.deps.store.fetch_association(&task.obj_id).await?;
        if stage == STAGE_COMPLETE {
            let obj = assoc.object_ref();
            self.deps
                .events
                .action_log(&obj, ACT_CREATE, "", &task.user, true);
            self.deps.events.event_notify(&obj, ACT_CREATE, &task.user);
            engine.set_stage_complete(&task.id, Value::Null).await
        } else if stage == failed_stage(STAGE_COMPLETE) {
            self.task_failed(engine.as_ref(), task, &assoc, &failure_reason(&data))
                .await
        } else {
            bail!("{} has no stage {}", ROUTE_TABLE_ASSOCIATION_CREATE_TASK, stage)
        }
    }
}
