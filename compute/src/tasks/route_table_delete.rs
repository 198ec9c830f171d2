use super::{TaskDeps, ROUTE_TABLE_DELETE_TASK};
use crate::models::RouteTable;
use crate::store::ACT_DELETE;
use crate::taskman::{failed_stage, failure_reason, Task, TaskEngine, TaskHandler};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::FutureExt;
use ocm_common::cloudprovider::CloudRouteTable;
use ocm_common::consts::{ROUTE_TABLE_DELETE_FAILED, ROUTE_TABLE_DELETING};
use serde_json::Value;
use std::sync::Arc;

const STAGE_COMPLETE: &str = "OnDeleteRouteTableComplete";

pub struct RouteTableDeleteTask {
    deps: TaskDeps,
}

impl RouteTableDeleteTask {
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
        tracing::warn!("Deleting route table {} failed: {}", table.id, reason);
        if let Err(e) = self
            .deps
            .store
            .set_route_table_status(&table.id, ROUTE_TABLE_DELETE_FAILED, reason)
            .await
        {
            tracing::error!("Failed to mark route table {} failed: {:#}", table.id, e);
        }
        let obj = table.object_ref();
        self.deps.events.ops_log(&obj, ACT_DELETE, reason, &task.user);
        self.deps
            .events
            .action_log(&obj, ACT_DELETE, reason, &task.user, false);
        engine.set_stage_failed(&task.id, reason).await
    }

    async fn resolve(&self, table: &RouteTable) -> Result<Box<dyn CloudRouteTable>> {
        let vpc = self.deps.store.fetch_vpc(&table.vpc_id).await?;
        self.deps.resolver.cloud_route_table(&vpc, table).await
    }
}

#[async_trait]
impl TaskHandler for RouteTableDeleteTask {
    fn name(&self) -> &'static str {
        ROUTE_TABLE_DELETE_TASK
    }

    async fn on_init(&self, engine: Arc<dyn TaskEngine>, task: &Task) -> Result<()> {
        let table = self.deps.store.fetch_route_table(&task.obj_id).await?;
        self.deps
            .store
            .set_route_table_status(&table.id, ROUTE_TABLE_DELETING, "")
            .await?;

        let irt = match self.resolve(&table).await.context("GetICloudRouteTable") {
            Ok(irt) => irt,
            Err(e) => {
                return self
                    .task_failed(engine.as_ref(), task, &table, &format!("{:#}", e))
                    .await
            }
        };

        engine.set_stage(&task.id, STAGE_COMPLETE).await?;
        let work = async move {
            irt.delete().await?;
            Ok::<_, anyhow::Error>(Value::Null)
        }
        .boxed();
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
            let obj = table.object_ref();
            self.deps
                .events
                .action_log(&obj, ACT_DELETE, "", &task.user, true);
            self.deps.events.event_notify(&obj, ACT_DELETE, &task.user);
            engine.set_stage_complete(&task.id, Value::Null).await
        } else if stage == failed_stage(STAGE_COMPLETE) {
            self.task_failed(engine.as_ref(), task, &table, &failure_reason(&data))
                .await
        } else {
            bail!("{} has no stage {}", ROUTE_TABLE_DELETE_TASK, stage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Harness, TaskState};

    fn put_table(h: &Harness, external_id: &str) {
        h.store.put_route_table(RouteTable {
            id: "rt-local".to_string(),
            name: "edge".to_string(),
            status: "available".to_string(),
            vpc_id: "vpc-local".to_string(),
            external_id: external_id.to_string(),
            ..Default::default()
        });
    }

    #[tokio::test]
    async fn test_delete_removes_cloud_table() {
        let h = Harness::new();
        h.cloud.add_route_table("rt-1", "available");
        put_table(&h, "rt-1");

        let task_id = h.start(ROUTE_TABLE_DELETE_TASK, "rt-local").await;

        assert_eq!(h.engine.record(&task_id).state, TaskState::Complete);
        assert_eq!(h.cloud.state().deleted, vec!["rt-1".to_string()]);
        assert_eq!(h.store.route_table("rt-local").status, "deleting");
        assert_eq!(
            h.sink.events(),
            vec!["action delete rt-local true", "notify delete rt-local"]
        );
    }

    #[tokio::test]
    async fn test_delete_failure_marks_delete_failed() {
        let h = Harness::new();
        h.cloud.add_route_table("rt-1", "available");
        h.cloud.state().fail_delete = true;
        put_table(&h, "rt-1");

        let task_id = h.start(ROUTE_TABLE_DELETE_TASK, "rt-local").await;

        let table = h.store.route_table("rt-local");
        assert_eq!(table.status, "delete_failed");
        assert_eq!(table.status_reason, "router is busy");
        assert_eq!(
            h.engine.record(&task_id).state,
            TaskState::Failed("router is busy".to_string())
        );
    }

    #[tokio::test]
    async fn test_unresolvable_table_fails_on_init() {
        let h = Harness::new();
        put_table(&h, "rt-missing");

        h.start(ROUTE_TABLE_DELETE_TASK, "rt-local").await;

        let table = h.store.route_table("rt-local");
        assert_eq!(table.status, "delete_failed");
        assert!(table.status_reason.starts_with("GetICloudRouteTable"));
        assert!(h.cloud.state().deleted.is_empty());
    }
}
