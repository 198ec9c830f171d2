//! Uniform interface every cloud adapter implements.
//!
//! Resources are handed out as boxed trait objects. Operations a backend
//! cannot perform keep the default body, which reports
//! [`CloudError::NotImplemented`]; lookups by id default to a scan of the
//! matching list call.

use crate::errors::CloudError;
use crate::secrules::SecurityRule;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub mod types;

pub use types::*;

fn not_implemented<T>(what: &str) -> Result<T> {
    Err(CloudError::not_implemented(what).into())
}

/// Pick the resource whose global id matches, or report it missing.
pub fn find_by_global_id<T>(items: Vec<Box<T>>, id: &str) -> Result<Box<T>>
where
    T: CloudResource + ?Sized,
{
    items
        .into_iter()
        .find(|item| item.global_id() == id)
        .ok_or_else(|| CloudError::not_found(id).into())
}

#[async_trait]
pub trait CloudResource: Send + Sync {
    fn id(&self) -> String;

    fn name(&self) -> String;

    fn global_id(&self) -> String;

    fn status(&self) -> String;

    /// Re-read the resource from the backend.
    async fn refresh(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_emulated(&self) -> bool {
        false
    }

    fn tags(&self) -> HashMap<String, String> {
        HashMap::new()
    }
}

#[async_trait]
pub trait CloudRegion: CloudResource {
    fn provider(&self) -> String;

    fn cloud_env(&self) -> String {
        String::new()
    }

    fn capabilities(&self) -> Vec<String>;

    fn geographic_info(&self) -> GeographicInfo {
        GeographicInfo::default()
    }

    async fn list_zones(&self) -> Result<Vec<Box<dyn CloudZone>>>;

    async fn get_zone(&self, id: &str) -> Result<Box<dyn CloudZone>> {
        find_by_global_id(self.list_zones().await?, id)
    }

    async fn list_hosts(&self) -> Result<Vec<Box<dyn CloudHost>>>;

    async fn get_host(&self, id: &str) -> Result<Box<dyn CloudHost>> {
        find_by_global_id(self.list_hosts().await?, id)
    }

    async fn list_vpcs(&self) -> Result<Vec<Box<dyn CloudVpc>>>;

    async fn get_vpc(&self, id: &str) -> Result<Box<dyn CloudVpc>> {
        find_by_global_id(self.list_vpcs().await?, id)
    }

    async fn create_vpc(&self, _opts: &VpcCreateOptions) -> Result<Box<dyn CloudVpc>> {
        not_implemented("create_vpc")
    }

    async fn list_eips(&self) -> Result<Vec<Box<dyn CloudEip>>>;

    async fn get_eip(&self, id: &str) -> Result<Box<dyn CloudEip>> {
        find_by_global_id(self.list_eips().await?, id)
    }

    async fn create_eip(&self, _opts: &EipCreateOptions) -> Result<Box<dyn CloudEip>> {
        not_implemented("create_eip")
    }

    async fn get_security_group(&self, _id: &str) -> Result<Box<dyn CloudSecurityGroup>> {
        not_implemented("get_security_group")
    }

    async fn get_security_group_by_name(
        &self,
        _opts: &SecurityGroupFilterOptions,
    ) -> Result<Box<dyn CloudSecurityGroup>> {
        not_implemented("get_security_group_by_name")
    }

    async fn create_security_group(
        &self,
        _input: &SecurityGroupCreateInput,
    ) -> Result<Box<dyn CloudSecurityGroup>> {
        not_implemented("create_security_group")
    }
}

#[async_trait]
pub trait CloudZone: CloudResource {
    async fn list_hosts(&self) -> Result<Vec<Box<dyn CloudHost>>>;

    async fn get_host(&self, id: &str) -> Result<Box<dyn CloudHost>> {
        find_by_global_id(self.list_hosts().await?, id)
    }

    async fn list_storages(&self) -> Result<Vec<Box<dyn CloudStorage>>>;

    async fn get_storage(&self, id: &str) -> Result<Box<dyn CloudStorage>> {
        find_by_global_id(self.list_storages().await?, id)
    }

    async fn list_wires(&self) -> Result<Vec<Box<dyn CloudWire>>>;
}

#[derive(Debug, Clone, Default)]
pub struct HostNicInfo {
    pub name: String,
    pub mac: String,
    pub ip: String,
}

#[async_trait]
pub trait CloudHost: CloudResource {
    async fn list_vms(&self) -> Result<Vec<Box<dyn CloudVm>>>;

    async fn get_vm(&self, id: &str) -> Result<Box<dyn CloudVm>> {
        find_by_global_id(self.list_vms().await?, id)
    }

    async fn list_wires(&self) -> Result<Vec<Box<dyn CloudWire>>>;

    async fn list_storages(&self) -> Result<Vec<Box<dyn CloudStorage>>>;

    async fn get_storage(&self, id: &str) -> Result<Box<dyn CloudStorage>> {
        find_by_global_id(self.list_storages().await?, id)
    }

    fn enabled(&self) -> bool {
        true
    }

    fn host_status(&self) -> String;

    fn access_ip(&self) -> String;

    fn access_mac(&self) -> String {
        String::new()
    }

    fn sys_info(&self) -> serde_json::Value {
        serde_json::json!({})
    }

    fn sn(&self) -> String {
        String::new()
    }

    fn cpu_count(&self) -> i64;

    fn node_count(&self) -> i64;

    fn cpu_desc(&self) -> String;

    fn cpu_mhz(&self) -> i64 {
        0
    }

    fn mem_size_mb(&self) -> i64;

    fn storage_size_mb(&self) -> i64;

    fn storage_type(&self) -> String;

    fn host_type(&self) -> String;

    fn is_maintenance(&self) -> bool {
        false
    }

    fn version(&self) -> String {
        String::new()
    }

    async fn create_vm(&self, desc: &VmCreateConfig) -> Result<Box<dyn CloudVm>>;

    async fn list_host_nics(&self) -> Result<Vec<HostNicInfo>> {
        Err(CloudError::not_supported("list_host_nics").into())
    }
}

#[async_trait]
pub trait CloudVm: CloudResource {
    fn project_id(&self) -> String {
        String::new()
    }

    fn hostname(&self) -> String;

    async fn os_arch(&self) -> String;

    async fn list_disks(&self) -> Result<Vec<Box<dyn CloudDisk>>>;

    async fn list_nics(&self) -> Result<Vec<Box<dyn CloudNic>>>;

    async fn get_eip(&self) -> Result<Box<dyn CloudEip>>;

    fn vcpu_count(&self) -> i64;

    fn vmem_size_mb(&self) -> i64;

    fn boot_order(&self) -> String;

    fn vga(&self) -> String {
        String::new()
    }

    fn vdi(&self) -> String {
        String::new()
    }

    fn os_type(&self) -> OsType;

    fn os_name(&self) -> String {
        String::new()
    }

    async fn bios(&self) -> String;

    fn machine(&self) -> String {
        String::new()
    }

    fn instance_type(&self) -> String;

    async fn security_group_ids(&self) -> Result<Vec<String>>;

    async fn assign_security_group(&self, _secgroup_id: &str) -> Result<()> {
        not_implemented("assign_security_group")
    }

    async fn set_security_groups(&self, _secgroup_ids: &[String]) -> Result<()> {
        not_implemented("set_security_groups")
    }

    fn hypervisor(&self) -> String;

    async fn start_vm(&mut self) -> Result<()> {
        not_implemented("start_vm")
    }

    async fn stop_vm(&mut self, _opts: &ServerStopOptions) -> Result<()> {
        not_implemented("stop_vm")
    }

    async fn delete_vm(&self) -> Result<()> {
        not_implemented("delete_vm")
    }

    async fn update_vm(&self, _name: &str) -> Result<()> {
        not_implemented("update_vm")
    }

    async fn update_user_data(&self, _user_data: &str) -> Result<()> {
        not_implemented("update_user_data")
    }

    async fn rebuild_root(&self, _config: &RebuildRootConfig) -> Result<String> {
        not_implemented("rebuild_root")
    }

    async fn deploy_vm(&self, _name: &str, _username: &str, _password: &str) -> Result<()> {
        not_implemented("deploy_vm")
    }

    async fn change_config(&self, _config: &ChangeConfig) -> Result<()> {
        not_implemented("change_config")
    }

    async fn vnc_info(&self) -> Result<VncInfo> {
        not_implemented("vnc_info")
    }

    async fn attach_disk(&self, _disk_id: &str) -> Result<()> {
        not_implemented("attach_disk")
    }

    async fn detach_disk(&self, _disk_id: &str) -> Result<()> {
        not_implemented("detach_disk")
    }
}

#[async_trait]
pub trait CloudNic: Send + Sync {
    fn id(&self) -> String;

    fn ip(&self) -> String;

    fn mac(&self) -> String;

    fn in_classic_network(&self) -> bool {
        false
    }

    fn driver(&self) -> String;

    fn network_id(&self) -> String;

    async fn sub_addresses(&self) -> Result<Vec<String>>;

    async fn assign_n_address(&self, _count: usize) -> Result<Vec<String>> {
        not_implemented("assign_n_address")
    }

    async fn assign_address(&self, _ips: &[String]) -> Result<()> {
        not_implemented("assign_address")
    }

    async fn unassign_address(&self, _ips: &[String]) -> Result<()> {
        not_implemented("unassign_address")
    }
}

#[async_trait]
pub trait CloudDisk: CloudResource {
    fn storage_id(&self) -> String;

    fn disk_format(&self) -> String;

    fn disk_size_mb(&self) -> i64;

    fn is_auto_delete(&self) -> bool {
        false
    }

    fn template_id(&self) -> String {
        String::new()
    }

    fn disk_type(&self) -> String;

    fn fs_format(&self) -> String {
        String::new()
    }

    fn is_non_persistent(&self) -> bool {
        false
    }

    fn driver(&self) -> String;

    fn cache_mode(&self) -> String;

    fn mountpoint(&self) -> String {
        String::new()
    }

    fn access_path(&self) -> String {
        String::new()
    }

    async fn delete(&self) -> Result<()> {
        not_implemented("delete disk")
    }

    async fn create_snapshot(&self, _name: &str, _desc: &str) -> Result<String> {
        not_implemented("create_snapshot")
    }

    async fn resize(&self, _new_size_mb: i64) -> Result<()> {
        not_implemented("resize")
    }

    async fn reset(&self, _snapshot_id: &str) -> Result<String> {
        not_implemented("reset")
    }

    async fn rebuild(&self) -> Result<()> {
        not_implemented("rebuild")
    }
}

#[async_trait]
pub trait CloudStorage: CloudResource {
    fn storagecache(&self) -> Box<dyn CloudStoragecache>;

    fn zone_id(&self) -> String;

    fn storage_type(&self) -> String;

    fn medium_type(&self) -> String;

    fn capacity_mb(&self) -> i64;

    fn capacity_used_mb(&self) -> i64;

    fn storage_conf(&self) -> serde_json::Value {
        serde_json::json!({})
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn create_disk(&self, _conf: &DiskCreateConfig) -> Result<Box<dyn CloudDisk>> {
        not_implemented("create_disk")
    }

    fn mount_point(&self) -> String {
        String::new()
    }

    fn is_sys_disk_store(&self) -> bool {
        true
    }

    async fn list_disks(&self) -> Result<Vec<Box<dyn CloudDisk>>>;

    async fn get_disk(&self, id: &str) -> Result<Box<dyn CloudDisk>> {
        find_by_global_id(self.list_disks().await?, id)
    }
}

#[async_trait]
pub trait CloudStoragecache: CloudResource {
    async fn list_images(&self) -> Result<Vec<Box<dyn CloudImage>>>;

    async fn get_image(&self, id: &str) -> Result<Box<dyn CloudImage>> {
        find_by_global_id(self.list_images().await?, id)
    }

    async fn list_customized_images(&self) -> Result<Vec<Box<dyn CloudImage>>> {
        not_implemented("list_customized_images")
    }

    async fn create_image(
        &self,
        _snapshot_id: &str,
        _name: &str,
        _os_type: &str,
        _desc: &str,
    ) -> Result<Box<dyn CloudImage>> {
        not_implemented("create_image")
    }

    async fn download_image(&self, _image_id: &str, _path: &str) -> Result<serde_json::Value> {
        not_implemented("download_image")
    }

    async fn upload_image(&self, _image_id: &str) -> Result<String> {
        not_implemented("upload_image")
    }

    fn path(&self) -> String {
        String::new()
    }
}

#[async_trait]
pub trait CloudImage: CloudResource {
    fn project_id(&self) -> String {
        String::new()
    }

    async fn delete(&self) -> Result<()> {
        not_implemented("delete image")
    }

    fn size_byte(&self) -> i64;

    fn image_type(&self) -> ImageType;

    fn image_status(&self) -> String;

    fn os_type(&self) -> OsType;

    fn os_dist(&self) -> String {
        String::new()
    }

    fn os_version(&self) -> String;

    fn os_arch(&self) -> String;

    fn min_os_disk_size_gb(&self) -> i64;

    fn min_ram_size_mb(&self) -> i64;

    fn image_format(&self) -> String;

    fn uefi(&self) -> bool {
        false
    }

    fn public_scope(&self) -> PublicScope;

    fn sub_images(&self) -> Vec<String> {
        Vec::new()
    }
}

#[async_trait]
pub trait CloudEip: CloudResource {
    fn project_id(&self) -> String {
        String::new()
    }

    fn ip_addr(&self) -> String;

    fn mode(&self) -> String;

    async fn network_id(&self) -> String;

    async fn vpc_id(&self) -> String;

    fn association_type(&self) -> String;

    fn association_external_id(&self) -> String;

    fn bandwidth(&self) -> i64;

    fn internet_charge_type(&self) -> String;

    async fn delete(&self) -> Result<()>;

    async fn associate(&self, conf: &AssociateConfig) -> Result<()>;

    async fn dissociate(&self) -> Result<()>;

    async fn change_bandwidth(&self, _bw: i64) -> Result<()> {
        Err(CloudError::not_supported("change_bandwidth").into())
    }
}

#[async_trait]
pub trait CloudSecurityGroup: CloudResource {
    fn project_id(&self) -> String {
        String::new()
    }

    fn description(&self) -> String;

    fn rules(&self) -> Result<Vec<SecurityRule>>;

    fn vpc_id(&self) -> String;

    /// Apply a rule diff: deletions first, then additions.
    async fn sync_rules(
        &self,
        common: &[SecurityRule],
        in_adds: &[SecurityRule],
        out_adds: &[SecurityRule],
        in_dels: &[SecurityRule],
        out_dels: &[SecurityRule],
    ) -> Result<()>;

    async fn references(&self) -> Result<Vec<SecurityGroupReference>> {
        Ok(Vec::new())
    }

    async fn delete(&self) -> Result<()> {
        not_implemented("delete security group")
    }
}

#[async_trait]
pub trait CloudVpc: CloudResource {
    fn region_id(&self) -> String;

    fn is_default(&self) -> bool;

    fn cidr_block(&self) -> String;

    async fn list_security_groups(&self) -> Result<Vec<Box<dyn CloudSecurityGroup>>>;

    async fn list_route_tables(&self) -> Result<Vec<Box<dyn CloudRouteTable>>>;

    async fn get_route_table(&self, id: &str) -> Result<Box<dyn CloudRouteTable>> {
        find_by_global_id(self.list_route_tables().await?, id)
    }

    async fn create_route_table(
        &self,
        _opts: &RouteTableCreateOptions,
    ) -> Result<Box<dyn CloudRouteTable>> {
        not_implemented("create_route_table")
    }

    async fn delete(&self) -> Result<()>;

    async fn list_wires(&self) -> Result<Vec<Box<dyn CloudWire>>>;

    async fn get_wire(&self, id: &str) -> Result<Box<dyn CloudWire>> {
        find_by_global_id(self.list_wires().await?, id)
    }

    fn external_access_mode(&self) -> String {
        crate::consts::VPC_EXTERNAL_ACCESS_MODE_EIP.to_string()
    }

    fn is_external_net(&self) -> bool {
        false
    }
}

#[async_trait]
pub trait CloudWire: CloudResource {
    fn vpc_id(&self) -> String;

    fn zone_id(&self) -> String;

    fn bandwidth(&self) -> i64;

    async fn create_network(&self, opts: &NetworkCreateOptions)
        -> Result<Box<dyn CloudNetwork>>;

    async fn list_networks(&self) -> Result<Vec<Box<dyn CloudNetwork>>>;

    async fn get_network(&self, id: &str) -> Result<Box<dyn CloudNetwork>> {
        find_by_global_id(self.list_networks().await?, id)
    }
}

#[async_trait]
pub trait CloudNetwork: CloudResource {
    fn project_id(&self) -> String {
        String::new()
    }

    fn wire_id(&self) -> String;

    fn ip_start(&self) -> String;

    fn ip_end(&self) -> String;

    fn ip_mask(&self) -> u8;

    fn gateway(&self) -> String;

    fn server_type(&self) -> String;

    fn public_scope(&self) -> PublicScope;

    async fn delete(&self) -> Result<()>;

    fn alloc_timeout_seconds(&self) -> i64 {
        120
    }
}

#[async_trait]
pub trait CloudRouteTable: CloudResource {
    fn description(&self) -> String {
        String::new()
    }

    fn region_id(&self) -> String;

    fn route_table_type(&self) -> RouteTableType;

    fn vpc_id(&self) -> String;

    async fn list_routes(&self) -> Result<Vec<Box<dyn CloudRoute>>>;

    async fn associations(&self) -> Vec<RouteTableAssociation>;

    async fn create_route(&self, _route: &RouteSet) -> Result<()> {
        not_implemented("create_route")
    }

    async fn update_route(&self, _route: &RouteSet) -> Result<()> {
        not_implemented("update_route")
    }

    async fn remove_route(&self, _route: &RouteSet) -> Result<()> {
        not_implemented("remove_route")
    }

    async fn add_route_interface(&self, _iface: &RouteInterface) -> Result<()> {
        not_implemented("add_route_interface")
    }

    async fn create_association(&self, _assoc: &RouteTableAssociation) -> Result<()> {
        not_implemented("create_association")
    }

    async fn delete(&self) -> Result<()> {
        not_implemented("delete route table")
    }
}

pub trait CloudRoute: CloudResource {
    fn route_type(&self) -> String;

    fn cidr(&self) -> String;

    fn next_hop_type(&self) -> String;

    fn next_hop(&self) -> String;
}

#[async_trait]
pub trait CloudProvider: Send + Sync {
    fn provider_name(&self) -> String;

    fn version(&self) -> String;

    async fn sys_info(&self) -> Result<serde_json::Value>;

    fn list_regions(&self) -> Vec<Box<dyn CloudRegion>>;

    async fn get_region(&self, id: &str) -> Result<Box<dyn CloudRegion>> {
        find_by_global_id(self.list_regions(), id)
    }

    async fn list_projects(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Account balance and its health status.
    async fn balance(&self) -> Result<(f64, String)> {
        Err(CloudError::not_supported("balance").into())
    }

    async fn sub_accounts(&self) -> Result<Vec<SubAccount>>;

    fn account_id(&self) -> String;

    fn storage_classes(&self, _region_id: &str) -> Vec<String> {
        Vec::new()
    }

    fn bucket_canned_acls(&self, _region_id: &str) -> Vec<String> {
        Vec::new()
    }

    fn object_canned_acls(&self, _region_id: &str) -> Vec<String> {
        Vec::new()
    }

    fn capabilities(&self) -> Vec<String>;
}

#[async_trait]
pub trait CloudProviderFactory: Send + Sync {
    fn id(&self) -> String;

    fn name(&self) -> String;

    fn is_public_cloud(&self) -> bool {
        false
    }

    fn is_on_premise(&self) -> bool {
        false
    }

    async fn get_provider(&self, cfg: ProviderConfig) -> Result<Box<dyn CloudProvider>>;

    fn get_client_rc(&self, info: &ProviderInfo) -> Result<HashMap<String, String>>;

    fn validate_change_bandwidth(&self, instance_id: &str, bandwidth: i64) -> Result<()>;

    fn validate_create_cloudaccount_data(
        &self,
        input: &CloudaccountCredential,
    ) -> Result<Cloudaccount>;

    fn validate_update_cloudaccount_credential(
        &self,
        input: &CloudaccountCredential,
        cloudaccount: &str,
    ) -> Result<Cloudaccount>;
}

/// Provider factories keyed by provider id.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    factories: HashMap<String, Arc<dyn CloudProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Arc<dyn CloudProviderFactory>) {
        tracing::debug!("Registering cloud provider factory {}", factory.id());
        self.factories.insert(factory.id(), factory);
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn CloudProviderFactory>> {
        self.factories
            .get(id)
            .cloned()
            .ok_or_else(|| CloudError::not_found(format!("provider factory {}", id)).into())
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.factories.keys().cloned().collect();
        ids.sort();
        ids
    }
}
