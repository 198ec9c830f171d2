//! In-memory stand-ins for the store, the task engine and a cloud backend.

use crate::models::{self, Network, ObjectRef, RouteTable, RouteTableRouteSet, Vpc};
use crate::store::{ComputeStore, EventSink};
use crate::taskman::{failed_stage, LocalWork, Task, TaskEngine, TaskRegistry};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::CloudError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

// ---------------------------------------------------------------- cloud side

#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub id: String,
    pub name: String,
    pub status: String,
    pub routes: Vec<RouteSet>,
    pub associations: Vec<RouteTableAssociation>,
}

#[derive(Debug, Default)]
pub struct CloudState {
    pub tables: Vec<FakeTable>,
    pub created: Vec<(String, String)>,
    pub created_routes: Vec<RouteSet>,
    pub removed_routes: Vec<RouteSet>,
    pub deleted: Vec<String>,
    pub fail_create_table: bool,
    pub fail_association: bool,
    pub fail_delete: bool,
    /// Association requests are accepted but never show up.
    pub hide_associations: bool,
    /// New route tables never leave `pending`.
    pub tables_stay_pending: bool,
}

/// Shared handle on a fake backend with one region and one VPC.
#[derive(Clone, Default)]
pub struct FakeCloud(Arc<Mutex<CloudState>>);

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, CloudState> {
        self.0.lock().unwrap()
    }

    pub fn add_route_table(&self, id: &str, status: &str) {
        self.state().tables.push(FakeTable {
            id: id.to_string(),
            name: id.to_string(),
            status: status.to_string(),
            ..Default::default()
        });
    }

    fn table(&self, id: &str) -> Option<FakeTable> {
        self.state().tables.iter().find(|t| t.id == id).cloned()
    }

    fn with_table<T>(&self, id: &str, f: impl FnOnce(&mut FakeTable) -> T) -> Result<T> {
        let mut state = self.state();
        let table = state
            .tables
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!(CloudError::not_found(id)))?;
        Ok(f(table))
    }
}

struct FakeRoute(RouteSet);

#[async_trait]
impl CloudResource for FakeRoute {
    fn id(&self) -> String {
        self.0.destination.clone()
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

impl CloudRoute for FakeRoute {
    fn route_type(&self) -> String {
        "custom".to_string()
    }

    fn cidr(&self) -> String {
        self.0.destination.clone()
    }

    fn next_hop_type(&self) -> String {
        self.0.next_hop_type.clone()
    }

    fn next_hop(&self) -> String {
        self.0.next_hop.clone()
    }
}

pub struct FakeRouteTable {
    cloud: FakeCloud,
    id: String,
    name: String,
    status: String,
}

impl FakeRouteTable {
    fn new(cloud: FakeCloud, table: &FakeTable) -> Self {
        Self {
            cloud,
            id: table.id.clone(),
            name: table.name.clone(),
            status: table.status.clone(),
        }
    }
}

#[async_trait]
impl CloudResource for FakeRouteTable {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn global_id(&self) -> String {
        self.id.clone()
    }

    fn status(&self) -> String {
        self.status.clone()
    }

    async fn refresh(&mut self) -> Result<()> {
        let table = self
            .cloud
            .table(&self.id)
            .ok_or_else(|| anyhow!(CloudError::not_found(&self.id)))?;
        self.status = table.status;
        Ok(())
    }
}

#[async_trait]
impl CloudRouteTable for FakeRouteTable {
    fn region_id(&self) -> String {
        "region-1".to_string()
    }

    fn route_table_type(&self) -> RouteTableType {
        RouteTableType::System
    }

    fn vpc_id(&self) -> String {
        "vpc-1".to_string()
    }

    async fn list_routes(&self) -> Result<Vec<Box<dyn CloudRoute>>> {
        let routes = self.cloud.with_table(&self.id, |t| t.routes.clone())?;
        Ok(routes
            .into_iter()
            .map(|r| Box::new(FakeRoute(r)) as Box<dyn CloudRoute>)
            .collect())
    }

    async fn associations(&self) -> Vec<RouteTableAssociation> {
        self.cloud
            .with_table(&self.id, |t| t.associations.clone())
            .unwrap_or_default()
    }

    async fn create_route(&self, route: &RouteSet) -> Result<()> {
        self.cloud.state().created_routes.push(route.clone());
        self.cloud
            .with_table(&self.id, |t| t.routes.push(route.clone()))
    }

    async fn remove_route(&self, route: &RouteSet) -> Result<()> {
        self.cloud.state().removed_routes.push(route.clone());
        self.cloud.with_table(&self.id, |t| {
            t.routes.retain(|r| r.destination != route.destination)
        })
    }

    async fn create_association(&self, assoc: &RouteTableAssociation) -> Result<()> {
        if self.cloud.state().fail_association {
            bail!("association refused");
        }
        if self.cloud.state().hide_associations {
            return Ok(());
        }
        let id = format!("{}:{}", self.id, assoc.associated_resource_id);
        self.cloud.with_table(&self.id, |t| {
            t.associations.push(RouteTableAssociation {
                association_id: id,
                ..assoc.clone()
            })
        })
    }

    async fn delete(&self) -> Result<()> {
        if self.cloud.state().fail_delete {
            bail!("router is busy");
        }
        let mut state = self.cloud.state();
        state.tables.retain(|t| t.id != self.id);
        state.deleted.push(self.id.clone());
        Ok(())
    }
}

pub struct FakeVpc {
    cloud: FakeCloud,
}

#[async_trait]
impl CloudResource for FakeVpc {
    fn id(&self) -> String {
        "vpc-1".to_string()
    }

    fn name(&self) -> String {
        "prod".to_string()
    }

    fn global_id(&self) -> String {
        self.id()
    }

    fn status(&self) -> String {
        "available".to_string()
    }
}

#[async_trait]
impl CloudVpc for FakeVpc {
    fn region_id(&self) -> String {
        "region-1".to_string()
    }

    fn is_default(&self) -> bool {
        true
    }

    fn cidr_block(&self) -> String {
        String::new()
    }

    async fn list_security_groups(&self) -> Result<Vec<Box<dyn CloudSecurityGroup>>> {
        Ok(Vec::new())
    }

    async fn list_route_tables(&self) -> Result<Vec<Box<dyn CloudRouteTable>>> {
        let tables = self.cloud.state().tables.clone();
        Ok(tables
            .iter()
            .map(|t| Box::new(FakeRouteTable::new(self.cloud.clone(), t)) as Box<dyn CloudRouteTable>)
            .collect())
    }

    async fn create_route_table(
        &self,
        opts: &RouteTableCreateOptions,
    ) -> Result<Box<dyn CloudRouteTable>> {
        let mut state = self.cloud.state();
        if state.fail_create_table {
            bail!("quota exceeded");
        }
        state
            .created
            .push((opts.name.clone(), opts.network_id.clone()));
        let table = FakeTable {
            id: "rt-new".to_string(),
            name: opts.name.clone(),
            status: "pending".to_string(),
            routes: vec![RouteSet {
                destination: "0.0.0.0/0".to_string(),
                next_hop_type: "system".to_string(),
                next_hop: "gw".to_string(),
                ..Default::default()
            }],
            associations: Vec::new(),
        };
        let status = if state.tables_stay_pending {
            "pending"
        } else {
            "available"
        };
        state.tables.push(FakeTable {
            status: status.to_string(),
            ..table.clone()
        });
        Ok(Box::new(FakeRouteTable::new(self.cloud.clone(), &table)))
    }

    async fn delete(&self) -> Result<()> {
        Ok(())
    }

    async fn list_wires(&self) -> Result<Vec<Box<dyn CloudWire>>> {
        Ok(Vec::new())
    }
}

pub struct FakeRegion {
    cloud: FakeCloud,
}

#[async_trait]
impl CloudResource for FakeRegion {
    fn id(&self) -> String {
        "region-1".to_string()
    }

    fn name(&self) -> String {
        "Region One".to_string()
    }

    fn global_id(&self) -> String {
        "Fake/region-1".to_string()
    }

    fn status(&self) -> String {
        "inservice".to_string()
    }
}

#[async_trait]
impl CloudRegion for FakeRegion {
    fn provider(&self) -> String {
        "Fake".to_string()
    }

    fn capabilities(&self) -> Vec<String> {
        Vec::new()
    }

    async fn list_zones(&self) -> Result<Vec<Box<dyn CloudZone>>> {
        Ok(Vec::new())
    }

    async fn list_hosts(&self) -> Result<Vec<Box<dyn CloudHost>>> {
        Ok(Vec::new())
    }

    async fn list_vpcs(&self) -> Result<Vec<Box<dyn CloudVpc>>> {
        Ok(vec![Box::new(FakeVpc {
            cloud: self.cloud.clone(),
        })])
    }

    async fn list_eips(&self) -> Result<Vec<Box<dyn CloudEip>>> {
        Ok(Vec::new())
    }
}

pub struct FakeProvider {
    cloud: FakeCloud,
}

impl FakeProvider {
    pub fn new(cloud: FakeCloud) -> Self {
        Self { cloud }
    }
}

#[async_trait]
impl CloudProvider for FakeProvider {
    fn provider_name(&self) -> String {
        "Fake".to_string()
    }

    fn version(&self) -> String {
        "1".to_string()
    }

    async fn sys_info(&self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn list_regions(&self) -> Vec<Box<dyn CloudRegion>> {
        vec![Box::new(FakeRegion {
            cloud: self.cloud.clone(),
        })]
    }

    async fn sub_accounts(&self) -> Result<Vec<SubAccount>> {
        Ok(Vec::new())
    }

    fn account_id(&self) -> String {
        "fake".to_string()
    }

    fn capabilities(&self) -> Vec<String> {
        Vec::new()
    }
}

// ---------------------------------------------------------------- platform side

#[derive(Debug, Default)]
pub struct StoreState {
    pub vpcs: BTreeMap<String, Vpc>,
    pub networks: BTreeMap<String, Network>,
    pub route_tables: BTreeMap<String, RouteTable>,
    pub associations: BTreeMap<String, models::RouteTableAssociation>,
    pub route_sets: Vec<RouteTableRouteSet>,
}

#[derive(Default)]
pub struct MemoryStore(Mutex<StoreState>);

impl MemoryStore {
    /// A store holding VPC `vpc-local` (cloud `vpc-1`) with network
    /// `net-local` (cloud `net-1`).
    pub fn seeded() -> Arc<Self> {
        let store = Self::default();
        {
            let mut state = store.state();
            state.vpcs.insert(
                "vpc-local".to_string(),
                Vpc {
                    id: "vpc-local".to_string(),
                    name: "prod".to_string(),
                    external_id: "vpc-1".to_string(),
                    region_external_id: "Fake/region-1".to_string(),
                },
            );
            state.networks.insert(
                "net-local".to_string(),
                Network {
                    id: "net-local".to_string(),
                    name: "backend".to_string(),
                    vpc_id: "vpc-local".to_string(),
                    external_id: "net-1".to_string(),
                },
            );
        }
        Arc::new(store)
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.0.lock().unwrap()
    }

    pub fn put_route_table(&self, table: RouteTable) {
        self.state().route_tables.insert(table.id.clone(), table);
    }

    pub fn put_association(&self, assoc: models::RouteTableAssociation) {
        self.state().associations.insert(assoc.id.clone(), assoc);
    }

    pub fn route_table(&self, id: &str) -> RouteTable {
        self.state().route_tables[id].clone()
    }

    pub fn association(&self, id: &str) -> models::RouteTableAssociation {
        self.state().associations[id].clone()
    }
}

fn missing(what: &str, id: &str) -> anyhow::Error {
    CloudError::not_found(format!("{} {}", what, id)).into()
}

#[async_trait]
impl ComputeStore for MemoryStore {
    async fn fetch_route_table(&self, id: &str) -> Result<RouteTable> {
        self.state()
            .route_tables
            .get(id)
            .cloned()
            .ok_or_else(|| missing("route table", id))
    }

    async fn fetch_association(&self, id: &str) -> Result<models::RouteTableAssociation> {
        self.state()
            .associations
            .get(id)
            .cloned()
            .ok_or_else(|| missing("association", id))
    }

    async fn fetch_network(&self, id: &str) -> Result<Network> {
        self.state()
            .networks
            .get(id)
            .cloned()
            .ok_or_else(|| missing("network", id))
    }

    async fn fetch_vpc(&self, id: &str) -> Result<Vpc> {
        self.state()
            .vpcs
            .get(id)
            .cloned()
            .ok_or_else(|| missing("vpc", id))
    }

    async fn network_by_ext_id(&self, vpc_id: &str, external_id: &str) -> Result<Network> {
        self.state()
            .networks
            .values()
            .find(|n| n.vpc_id == vpc_id && n.external_id == external_id)
            .cloned()
            .ok_or_else(|| missing("network", external_id))
    }

    async fn set_route_table_status(&self, id: &str, status: &str, reason: &str) -> Result<()> {
        let mut state = self.state();
        let table = state
            .route_tables
            .get_mut(id)
            .ok_or_else(|| missing("route table", id))?;
        table.status = status.to_string();
        table.status_reason = reason.to_string();
        Ok(())
    }

    async fn set_association_status(&self, id: &str, status: &str, reason: &str) -> Result<()> {
        let mut state = self.state();
        let assoc = state
            .associations
            .get_mut(id)
            .ok_or_else(|| missing("association", id))?;
        assoc.status = status.to_string();
        assoc.status_reason = reason.to_string();
        Ok(())
    }

    async fn set_association_external_id(&self, id: &str, external_id: &str) -> Result<()> {
        let mut state = self.state();
        let assoc = state
            .associations
            .get_mut(id)
            .ok_or_else(|| missing("association", id))?;
        assoc.external_id = external_id.to_string();
        Ok(())
    }

    async fn update_association(&self, assoc: &models::RouteTableAssociation) -> Result<()> {
        self.state()
            .associations
            .insert(assoc.id.clone(), assoc.clone());
        Ok(())
    }

    async fn count_associations(
        &self,
        route_table_id: &str,
        associated_resource_id: &str,
        association_type: &str,
    ) -> Result<usize> {
        Ok(self
            .state()
            .associations
            .values()
            .filter(|a| {
                a.route_table_id == route_table_id
                    && a.associated_resource_id == associated_resource_id
                    && a.association_type == association_type
            })
            .count())
    }

    async fn insert_association(
        &self,
        mut assoc: models::RouteTableAssociation,
    ) -> Result<models::RouteTableAssociation> {
        let mut state = self.state();
        assoc.id = format!("assoc-{}", state.associations.len() + 1);
        state.associations.insert(assoc.id.clone(), assoc.clone());
        Ok(assoc)
    }

    async fn delete_association(&self, id: &str) -> Result<()> {
        self.state()
            .associations
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| missing("association", id))
    }

    async fn sync_route_table(
        &self,
        route_table_id: &str,
        _vpc: &Vpc,
        cloud: &dyn CloudRouteTable,
    ) -> Result<()> {
        let mut state = self.state();
        let table = state
            .route_tables
            .get_mut(route_table_id)
            .ok_or_else(|| missing("route table", route_table_id))?;
        table.external_id = cloud.global_id();
        table.name = cloud.name();
        table.status = cloud.status();
        Ok(())
    }

    async fn sync_route_sets(
        &self,
        route_table_id: &str,
        cloud: &dyn CloudRouteTable,
    ) -> Result<()> {
        let routes = cloud.list_routes().await?;
        let mut state = self.state();
        state.route_sets.retain(|r| r.route_table_id != route_table_id);
        state
            .route_sets
            .extend(routes.iter().map(|r| RouteTableRouteSet {
                route_table_id: route_table_id.to_string(),
                external_id: r.global_id(),
                route_type: r.route_type(),
                cidr: r.cidr(),
                next_hop_type: r.next_hop_type(),
                next_hop_id: r.next_hop(),
            }));
        Ok(())
    }
}

/// Keeps every event as a short line for assertions.
#[derive(Default)]
pub struct RecordingSink(Mutex<Vec<String>>);

impl RecordingSink {
    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn ops_log(&self, obj: &ObjectRef, action: &str, _notes: &str, _user: &str) {
        self.0
            .lock()
            .unwrap()
            .push(format!("ops {} {} {}", action, obj.kind, obj.id));
    }

    fn action_log(&self, obj: &ObjectRef, action: &str, _notes: &str, _user: &str, success: bool) {
        self.0
            .lock()
            .unwrap()
            .push(format!("action {} {} {}", action, obj.id, success));
    }

    fn event_notify(&self, obj: &ObjectRef, action: &str, _user: &str) {
        self.0
            .lock()
            .unwrap()
            .push(format!("notify {} {}", action, obj.id));
    }
}

// ---------------------------------------------------------------- engine

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Running,
    Complete,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub task: Task,
    pub stage: String,
    pub state: TaskState,
}

/// Runs every stage inline, so a task has finished once `new_task` returns.
pub struct InlineEngine {
    me: Weak<InlineEngine>,
    registry: TaskRegistry,
    tasks: Mutex<BTreeMap<String, TaskRecord>>,
}

impl InlineEngine {
    pub fn new(registry: TaskRegistry) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            registry,
            tasks: Mutex::new(BTreeMap::new()),
        })
    }

    fn handle(&self) -> Result<Arc<dyn TaskEngine>> {
        let me: Arc<dyn TaskEngine> = self.me.upgrade().ok_or_else(|| anyhow!("engine dropped"))?;
        Ok(me)
    }

    pub fn record(&self, task_id: &str) -> TaskRecord {
        self.tasks.lock().unwrap()[task_id].clone()
    }

    pub fn records(&self) -> Vec<TaskRecord> {
        self.tasks.lock().unwrap().values().cloned().collect()
    }

    fn update(&self, task_id: &str, f: impl FnOnce(&mut TaskRecord)) -> Result<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let record = tasks
            .get_mut(task_id)
            .ok_or_else(|| anyhow!("unknown task {}", task_id))?;
        f(record);
        Ok(())
    }
}

#[async_trait]
impl TaskEngine for InlineEngine {
    async fn new_task(&self, name: &str, obj_id: &str, user: &str, data: Value) -> Result<String> {
        let handler = self.registry.get(name)?;
        let task = {
            let mut tasks = self.tasks.lock().unwrap();
            let task = Task {
                id: format!("task-{}", tasks.len() + 1),
                name: name.to_string(),
                obj_id: obj_id.to_string(),
                user: user.to_string(),
                data,
            };
            tasks.insert(
                task.id.clone(),
                TaskRecord {
                    task: task.clone(),
                    stage: "OnInit".to_string(),
                    state: TaskState::Running,
                },
            );
            task
        };
        handler.on_init(self.handle()?, &task).await?;
        Ok(task.id)
    }

    async fn set_stage(&self, task_id: &str, stage: &str) -> Result<()> {
        self.update(task_id, |r| r.stage = stage.to_string())
    }

    async fn set_stage_complete(&self, task_id: &str, _data: Value) -> Result<()> {
        self.update(task_id, |r| r.state = TaskState::Complete)
    }

    async fn set_stage_failed(&self, task_id: &str, reason: &str) -> Result<()> {
        self.update(task_id, |r| r.state = TaskState::Failed(reason.to_string()))
    }

    async fn local_task_run(&self, task_id: &str, work: LocalWork) -> Result<()> {
        let result = work.await;
        let record = self.record(task_id);
        let handler = self.registry.get(&record.task.name)?;
        let (stage, data) = match result {
            Ok(data) => (record.stage.clone(), data),
            Err(e) => (failed_stage(&record.stage), Value::String(format!("{:#}", e))),
        };
        handler
            .on_stage(self.handle()?, &record.task, &stage, data)
            .await
    }
}

// ---------------------------------------------------------------- wiring

/// A fake cloud, a seeded store and an inline engine with the route-table
/// tasks registered.
pub struct Harness {
    pub cloud: FakeCloud,
    pub store: Arc<MemoryStore>,
    pub sink: Arc<RecordingSink>,
    pub engine: Arc<InlineEngine>,
}

impl Harness {
    pub fn new() -> Self {
        let cloud = FakeCloud::new();
        let store = MemoryStore::seeded();
        let sink = Arc::new(RecordingSink::default());
        let deps = crate::tasks::TaskDeps {
            store: store.clone(),
            resolver: Arc::new(crate::store::ProviderResolver::new(Arc::new(
                FakeProvider::new(cloud.clone()),
            ))),
            events: sink.clone(),
        };
        let mut registry = TaskRegistry::new();
        crate::tasks::register_tasks(&mut registry, &deps);
        Self {
            cloud,
            store,
            sink,
            engine: InlineEngine::new(registry),
        }
    }

    pub async fn start(&self, name: &str, obj_id: &str) -> String {
        self.engine
            .new_task(name, obj_id, "admin", Value::Null)
            .await
            .unwrap()
    }
}
