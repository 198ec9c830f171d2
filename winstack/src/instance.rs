use crate::client::{decode, decode_list, paginate, PageQuery, HYPERVISOR_WINSTACK};
use crate::eip::Eip;
use crate::region::Region;
use crate::storage::Storage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::*;
use ocm_common::{wait_status, CloudError};
use serde::Deserialize;
use std::time::Duration;

const INSTANCE_LIST_URL: &str = "/api/compute/domains";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceDiskRef {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub vol_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub storage_pool_id: String,
    #[serde(deserialize_with = "crate::de::int")]
    pub storage_pool_type: i64,
    #[serde(deserialize_with = "crate::de::string")]
    pub file_name: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub dev: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub bus: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub path: String,
    #[serde(deserialize_with = "crate::de::int")]
    pub boot_order: i64,
    #[serde(deserialize_with = "crate::de::int")]
    pub virtual_size: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
    #[serde(deserialize_with = "crate::de::int")]
    pub status: i64,
    #[serde(deserialize_with = "crate::de::int")]
    pub os_type: i64,
    #[serde(alias = "vcpu", deserialize_with = "crate::de::int")]
    pub v_cpu: i64,
    /// Bytes.
    #[serde(deserialize_with = "crate::de::int")]
    pub memory: i64,
    pub domain_disk_db_rsp_list: Vec<InstanceDiskRef>,
}

impl InstanceInfo {
    /// Falls back to the id for unnamed domains.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.id.clone()
        } else {
            self.name.clone()
        }
    }

    pub fn status_name(&self) -> &'static str {
        match self.status {
            1 => VM_RUNNING,
            2 => VM_READY,
            3 => VM_STARTING,
            _ => VM_UNKNOWN,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CpuDetail {
    #[serde(deserialize_with = "crate::de::int")]
    pub arch: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceDetail {
    #[serde(deserialize_with = "crate::de::int")]
    pub boot_type: i64,
    pub cpu: CpuDetail,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VpcInterface {
    #[serde(deserialize_with = "crate::de::string")]
    pub private_net_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub private_net_name: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub interface_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub mac: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub ip: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VpcDomain {
    #[serde(deserialize_with = "crate::de::string")]
    pub domain_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub domain_show_name: String,
    pub interface_list: Vec<VpcInterface>,
}

/// Domains attached to one VPC and their ports.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VpcInstances {
    #[serde(deserialize_with = "crate::de::string")]
    pub vpc_id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub vpc_name: String,
    pub vpc_list: Vec<VpcDomain>,
}

pub(crate) fn os_arch_name(code: i64) -> &'static str {
    match code {
        1 => OS_ARCH_X86,
        2 => OS_ARCH_X86_64,
        3 => OS_ARCH_AARCH64,
        4 => OS_ARCH_MIPS64EL,
        _ => "",
    }
}

pub(crate) fn os_type_from_code(code: i64) -> OsType {
    if code == 1 {
        OsType::Linux
    } else {
        OsType::Windows
    }
}

#[derive(Clone)]
pub struct Instance {
    region: Region,
    zone_id: String,
    info: InstanceInfo,
}

impl Region {
    pub async fn get_instances(
        &self,
        id: &str,
        host_id: &str,
        cluster_id: &str,
        name: &str,
        start: i64,
        size: i64,
    ) -> Result<Vec<InstanceInfo>> {
        let query = PageQuery::new(start, size)
            .filter("hostId", host_id)
            .id("id", id)
            .filter("clusterId", cluster_id)
            .filter("name", name);
        let resp = self.client().get(INSTANCE_LIST_URL, &query.params()).await?;
        decode_list(resp, "data")
    }

    pub async fn instances_by_host(&self, host_id: &str) -> Result<Vec<InstanceInfo>> {
        paginate(|start, size| self.get_instances("", host_id, "", "", start, size)).await
    }

    pub async fn instances_by_cluster(&self, cluster_id: &str) -> Result<Vec<InstanceInfo>> {
        paginate(|start, size| self.get_instances("", "", cluster_id, "", start, size)).await
    }

    pub async fn get_instance_by_name(&self, name: &str) -> Result<InstanceInfo> {
        self.get_instances("", "", "", name, 0, 1)
            .await?
            .into_iter()
            .find(|vm| vm.display_name() == name)
            .ok_or_else(|| CloudError::not_found(name).into())
    }

    pub async fn get_instance_by_id(&self, id: &str) -> Result<InstanceInfo> {
        self.get_instances(id, "", "", "", 0, 1)
            .await?
            .into_iter()
            .find(|vm| vm.id == id)
            .ok_or_else(|| CloudError::not_found(id).into())
    }

    pub async fn get_instance_detail(&self, id: &str) -> Result<InstanceDetail> {
        let url = format!("{}/{}", INSTANCE_LIST_URL, id);
        let resp = self.client().get(&url, &[]).await?;
        decode(resp, "")
    }

    pub async fn instances_by_vpc(&self, vpc_id: &str) -> Result<VpcInstances> {
        let url = format!("/api/compute/domainVpc/{}", vpc_id);
        let resp = self.client().get(&url, &[]).await?;
        decode(resp, "")
    }

    pub async fn start_instance(&self, id: &str) -> Result<()> {
        let url = format!("{}/{}/act/start", INSTANCE_LIST_URL, id);
        self.client().patch(&url).await.context("Region.StartVM")?;
        Ok(())
    }

    pub async fn stop_instance(&self, id: &str) -> Result<()> {
        let url = format!("{}/{}/act/shutdown", INSTANCE_LIST_URL, id);
        self.client().patch(&url).await.context("Region.StopVM")?;
        Ok(())
    }

    pub async fn delete_instance(&self, id: &str) -> Result<()> {
        let url = format!("{}/{}/2", INSTANCE_LIST_URL, id);
        self.client().delete(&url).await.context("Region.DeleteVM")?;
        Ok(())
    }

    pub fn vnc_info(&self, id: &str) -> VncInfo {
        VncInfo {
            url: format!(
                "{}{}/{}/noVNC/vnc",
                self.client().endpoint(),
                INSTANCE_LIST_URL,
                id
            ),
            protocol: HYPERVISOR_WINSTACK.to_string(),
            instance_id: id.to_string(),
            hypervisor: HYPERVISOR_WINSTACK.to_string(),
        }
    }
}

impl Instance {
    pub(crate) fn new(region: Region, zone_id: &str, info: InstanceInfo) -> Self {
        Self {
            region,
            zone_id: zone_id.to_string(),
            info,
        }
    }

    pub fn info(&self) -> &InstanceInfo {
        &self.info
    }
}

#[async_trait]
impl CloudResource for Instance {
    fn id(&self) -> String {
        self.info.id.clone()
    }

    fn name(&self) -> String {
        self.info.display_name()
    }

    fn global_id(&self) -> String {
        self.info.id.clone()
    }

    fn status(&self) -> String {
        self.info.status_name().to_string()
    }

    async fn refresh(&mut self) -> Result<()> {
        self.info = self.region.get_instance_by_id(&self.info.id).await?;
        Ok(())
    }
}

#[async_trait]
impl CloudVm for Instance {
    fn hostname(&self) -> String {
        self.info.name.clone()
    }

    async fn os_arch(&self) -> String {
        match self.region.get_instance_detail(&self.info.id).await {
            Ok(detail) => os_arch_name(detail.cpu.arch).to_string(),
            Err(_) => String::new(),
        }
    }

    async fn list_disks(&self) -> Result<Vec<Box<dyn CloudDisk>>> {
        let mut disks = Vec::new();
        for disk in &self.info.domain_disk_db_rsp_list {
            let info = self.region.get_storage_record(&disk.storage_pool_id).await?;
            let storage = Storage::new(self.region.clone(), &self.zone_id, info);
            disks.push(Box::new(storage.disk_by_id(&disk.vol_id).await?) as Box<dyn CloudDisk>);
        }
        Ok(disks)
    }

    async fn list_nics(&self) -> Result<Vec<Box<dyn CloudNic>>> {
        Ok(self
            .region
            .instance_nics(&self.info.id)
            .await?
            .into_iter()
            .map(|nic| Box::new(nic) as Box<dyn CloudNic>)
            .collect())
    }

    async fn get_eip(&self) -> Result<Box<dyn CloudEip>> {
        self.region
            .eips()
            .await?
            .into_iter()
            .find(|eip| eip.info().bind_dev_id == self.info.id)
            .map(|eip: Eip| Box::new(eip) as Box<dyn CloudEip>)
            .ok_or_else(|| CloudError::not_found(format!("eip of {}", self.info.id)).into())
    }

    fn vcpu_count(&self) -> i64 {
        self.info.v_cpu
    }

    fn vmem_size_mb(&self) -> i64 {
        self.info.memory / 1024 / 1024
    }

    fn boot_order(&self) -> String {
        "dcn".to_string()
    }

    fn os_type(&self) -> OsType {
        os_type_from_code(self.info.os_type)
    }

    async fn bios(&self) -> String {
        match self.region.get_instance_detail(&self.info.id).await {
            Ok(detail) if detail.boot_type == 0 => "BIOS".to_string(),
            _ => "UEFI".to_string(),
        }
    }

    fn instance_type(&self) -> String {
        format!(
            "ecs.g1.c{}m{}",
            self.vcpu_count(),
            self.vmem_size_mb() / 1024
        )
    }

    async fn security_group_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .region
            .security_groups_by_vm(&self.info.id)
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect())
    }

    async fn set_security_groups(&self, _secgroup_ids: &[String]) -> Result<()> {
        Ok(())
    }

    fn hypervisor(&self) -> String {
        HYPERVISOR_WINSTACK.to_string()
    }

    async fn start_vm(&mut self) -> Result<()> {
        self.region
            .start_instance(&self.info.id)
            .await
            .context("Instance.StartVM")?;
        wait_status(self, VM_RUNNING, Duration::from_secs(5), Duration::from_secs(300))
            .await
            .context("Instance.StartVM.WaitStatus")
    }

    async fn stop_vm(&mut self, _opts: &ServerStopOptions) -> Result<()> {
        self.region
            .stop_instance(&self.info.id)
            .await
            .context("Instance.StopVM")?;
        wait_status(self, VM_READY, Duration::from_secs(5), Duration::from_secs(300))
            .await
            .context("Instance.StopVM.WaitStatus")
    }

    async fn delete_vm(&self) -> Result<()> {
        self.region
            .delete_instance(&self.info.id)
            .await
            .context("Instance.DeleteVM")
    }

    async fn vnc_info(&self) -> Result<VncInfo> {
        Ok(self.region.vnc_info(&self.info.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mock_json, path, test_region};
    use mockito::Server;

    fn vm(status: i64) -> InstanceInfo {
        InstanceInfo {
            id: "vm-1".to_string(),
            name: String::new(),
            status,
            os_type: 1,
            v_cpu: 4,
            memory: 8 * 1024 * 1024 * 1024,
            ..Default::default()
        }
    }

    #[test]
    fn test_status_and_sizing() {
        assert_eq!(vm(1).status_name(), "running");
        assert_eq!(vm(2).status_name(), "ready");
        assert_eq!(vm(3).status_name(), "starting");
        assert_eq!(vm(9).status_name(), "unknown");
        assert_eq!(vm(1).display_name(), "vm-1");
        assert_eq!(os_arch_name(4), "mips64el");
        assert_eq!(os_arch_name(7), "");
        assert_eq!(os_type_from_code(2), OsType::Windows);
    }

    #[tokio::test]
    async fn test_instance_attributes() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        let instance = Instance::new(region, "c-1", vm(1));
        mock_json(
            &mut server,
            "GET",
            "/api/compute/domains/vm-1",
            r#"{"bootType":0,"cpu":{"arch":2}}"#,
        )
        .await;

        assert_eq!(instance.instance_type(), "ecs.g1.c4m8");
        assert_eq!(instance.vmem_size_mb(), 8192);
        assert_eq!(instance.boot_order(), "dcn");
        assert_eq!(instance.os_type(), OsType::Linux);
        assert_eq!(instance.os_arch().await, "x86_64");
        assert_eq!(instance.bios().await, "BIOS");
        assert_eq!(instance.hypervisor(), "winstack");
        assert!(instance.set_security_groups(&["sg-1".to_string()]).await.is_ok());
        assert!(ocm_common::is_not_implemented(
            &instance.assign_security_group("sg-1").await.unwrap_err()
        ));

        let vnc = instance.vnc_info().await.unwrap();
        assert_eq!(vnc.url, format!("{}/api/compute/domains/vm-1/noVNC/vnc", server.url()));
        assert_eq!(vnc.protocol, "winstack");
    }

    #[tokio::test]
    async fn test_bios_defaults_to_uefi_on_error() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        let instance = Instance::new(region, "c-1", vm(1));
        let _m = server
            .mock("GET", "/api/compute/domains/vm-1")
            .with_status(500)
            .create_async()
            .await;

        assert_eq!(instance.bios().await, "UEFI");
        assert_eq!(instance.os_arch().await, "");
    }

    #[tokio::test]
    async fn test_start_waits_for_running() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        let mut instance = Instance::new(region, "c-1", vm(2));
        let start = server
            .mock("PATCH", "/api/compute/domains/vm-1/act/start")
            .with_status(200)
            .create_async()
            .await;
        let _list = server
            .mock("GET", path("/api/compute/domains"))
            .with_status(200)
            .with_body(r#"{"data":[{"id":"vm-1","status":1}]}"#)
            .create_async()
            .await;

        instance.start_vm().await.unwrap();
        assert_eq!(instance.status(), "running");
        start.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_uses_mode_two() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        let instance = Instance::new(region, "c-1", vm(2));
        let m = server
            .mock("DELETE", "/api/compute/domains/vm-1/2")
            .with_status(200)
            .create_async()
            .await;

        instance.delete_vm().await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_eip_matches_bound_device() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        let instance = Instance::new(region, "c-1", vm(1));
        mock_json(
            &mut server,
            "GET",
            "/api/network/floatIps",
            r#"{"data":[{"id":"eip-1","ip":"203.0.113.5","bindDevType":"VM","bindDevId":"vm-9"},{"id":"eip-2","ip":"203.0.113.6","bindDevType":"VM","bindDevId":"vm-1"}]}"#,
        )
        .await;

        let eip = instance.get_eip().await.unwrap();
        assert_eq!(eip.global_id(), "eip-2");
        assert_eq!(eip.association_type(), "server");
    }

    #[tokio::test]
    async fn test_security_group_ids() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        let instance = Instance::new(region, "c-1", vm(1));
        mock_json(
            &mut server,
            "GET",
            "/api/network/vpc/vms/vm-1/security-groups",
            r#"{"security_groups":[{"id":"sg-1","name":"default"},{"id":"sg-2","name":"web"}]}"#,
        )
        .await;

        assert_eq!(
            instance.security_group_ids().await.unwrap(),
            vec!["sg-1".to_string(), "sg-2".to_string()]
        );
    }
}
