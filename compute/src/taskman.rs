//! Contract of the task engine that drives multi-stage workflows.
//!
//! The engine lives outside this crate. Handlers registered here are
//! invoked with `on_init` when a task starts and with `on_stage` whenever
//! the engine dispatches the task's current stage, or `<stage>Failed` when
//! the local work for that stage returned an error.

use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;
use ocm_common::CloudError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Work the engine runs off the request path; its result is handed to the
/// current stage.
pub type LocalWork = BoxFuture<'static, Result<Value>>;

pub const FAILED_SUFFIX: &str = "Failed";

#[derive(Debug, Clone, Default)]
pub struct Task {
    pub id: String,
    pub name: String,
    /// Id of the record the task operates on.
    pub obj_id: String,
    pub user: String,
    pub data: Value,
}

#[async_trait]
pub trait TaskEngine: Send + Sync {
    /// Create a task for `obj_id` and schedule it; returns the task id.
    async fn new_task(&self, name: &str, obj_id: &str, user: &str, data: Value) -> Result<String>;

    async fn set_stage(&self, task_id: &str, stage: &str) -> Result<()>;

    async fn set_stage_complete(&self, task_id: &str, data: Value) -> Result<()>;

    async fn set_stage_failed(&self, task_id: &str, reason: &str) -> Result<()>;

    /// Run `work`, then dispatch the current stage with its outcome.
    async fn local_task_run(&self, task_id: &str, work: LocalWork) -> Result<()>;
}

#[async_trait]
pub trait TaskHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_init(&self, engine: Arc<dyn TaskEngine>, task: &Task) -> Result<()>;

    async fn on_stage(
        &self,
        engine: Arc<dyn TaskEngine>,
        task: &Task,
        stage: &str,
        data: Value,
    ) -> Result<()>;
}

/// Name of the stage dispatched when `stage`'s local work fails.
pub fn failed_stage(stage: &str) -> String {
    format!("{}{}", stage, FAILED_SUFFIX)
}

/// Text carried by a failed stage's data.
pub fn failure_reason(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        Value::Null => "unknown error".to_string(),
        other => other.to_string(),
    }
}

#[derive(Default, Clone)]
pub struct TaskRegistry {
    handlers: HashMap<&'static str, Arc<dyn TaskHandler>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn TaskHandler>) {
        tracing::debug!("Registering task {}", handler.name());
        self.handlers.insert(handler.name(), handler);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn TaskHandler>> {
        self.handlers
            .get(name)
            .cloned()
            .ok_or_else(|| CloudError::not_found(format!("task {}", name)).into())
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort();
        names
    }
}
