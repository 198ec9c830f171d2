//! Route-table workflows run by the task engine.

use crate::store::{CloudResolver, ComputeStore, EventSink};
use crate::taskman::TaskRegistry;
use std::sync::Arc;
use std::time::Duration;

mod route_table_association_create;
mod route_table_create;
mod route_table_delete;

pub use route_table_association_create::RouteTableAssociationCreateTask;
pub use route_table_create::RouteTableCreateTask;
pub use route_table_delete::RouteTableDeleteTask;

pub const ROUTE_TABLE_CREATE_TASK: &str = "RouteTableCreateTask";
pub const ROUTE_TABLE_ASSOCIATION_CREATE_TASK: &str = "RouteTableAssociationCreateTask";
pub const ROUTE_TABLE_DELETE_TASK: &str = "RouteTableDeleteTask";

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const ROUTE_TABLE_READY_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const ASSOCIATION_READY_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// What every route-table task needs from the platform.
#[derive(Clone)]
pub struct TaskDeps {
    pub store: Arc<dyn ComputeStore>,
    pub resolver: Arc<dyn CloudResolver>,
    pub events: Arc<dyn EventSink>,
}

pub fn register_tasks(registry: &mut TaskRegistry, deps: &TaskDeps) {
    registry.register(Arc::new(RouteTableCreateTask::new(deps.clone())));
    registry.register(Arc::new(RouteTableAssociationCreateTask::new(deps.clone())));
    registry.register(Arc::new(RouteTableDeleteTask::new(deps.clone())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TracingEventSink;
    use crate::test_support::{FakeCloud, FakeProvider, MemoryStore};
    use crate::store::ProviderResolver;

    #[test]
    fn test_register_tasks() {
        let deps = TaskDeps {
            store: MemoryStore::seeded(),
            resolver: Arc::new(ProviderResolver::new(Arc::new(FakeProvider::new(
                FakeCloud::new(),
            )))),
            events: Arc::new(TracingEventSink),
        };
        let mut registry = TaskRegistry::new();
        register_tasks(&mut registry, &deps);
        assert_eq!(
            registry.names(),
            vec![
                ROUTE_TABLE_ASSOCIATION_CREATE_TASK,
                ROUTE_TABLE_CREATE_TASK,
                ROUTE_TABLE_DELETE_TASK
            ]
        );
    }
}
