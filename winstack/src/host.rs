use crate::client::{decode_list, paginate, PageQuery, HYPERVISOR_WINSTACK};
use crate::cluster::Cluster;
use crate::instance::Instance;
use crate::region::Region;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::*;
use ocm_common::wait_created;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const HOST_LIST_URL: &str = "/api/compute/hosts";
const GIB: i64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub cluster_id: String,
    #[serde(deserialize_with = "crate::de::int")]
    pub cpu_cores: i64,
    #[serde(deserialize_with = "crate::de::flag")]
    pub is_connected: bool,
    #[serde(deserialize_with = "crate::de::flag")]
    pub is_maintain: bool,
    #[serde(deserialize_with = "crate::de::string")]
    pub ip: String,
    #[serde(deserialize_with = "crate::de::int")]
    pub cpu_sockets: i64,
    #[serde(deserialize_with = "crate::de::string")]
    pub cpu_model_name: String,
    /// Bytes.
    #[serde(deserialize_with = "crate::de::int")]
    pub memory: i64,
    /// Bytes.
    #[serde(deserialize_with = "crate::de::int")]
    pub storage: i64,
}

/// A hypervisor node inside a cluster.
#[derive(Clone)]
pub struct Host {
    cluster: Cluster,
    info: HostInfo,
}

/// Resolved inputs for one deploy request.
pub(crate) struct DeploySpec<'a> {
    pub name: &'a str,
    pub host_id: &'a str,
    pub image_id: &'a str,
    pub cpu: i64,
    pub memory_mb: i64,
    pub network_id: &'a str,
    pub vpc_id: &'a str,
    pub sys_disk_capacity: i64,
    pub pool_name: &'a str,
    pub ip_addr: &'a str,
}

impl Region {
    pub async fn get_hosts(
        &self,
        cluster_id: &str,
        host_id: &str,
        start: i64,
        size: i64,
    ) -> Result<Vec<HostInfo>> {
        let query = PageQuery::new(start, size)
            .filter("clusterId", cluster_id)
            .filter("hostIds", host_id);
        let resp = self.client().get(HOST_LIST_URL, &query.params()).await?;
        decode_list(resp, "data")
    }

    pub async fn hosts(&self, cluster_id: &str, host_id: &str) -> Result<Vec<HostInfo>> {
        paginate(|start, size| self.get_hosts(cluster_id, host_id, start, size)).await
    }

    /// Deploy one VM from a template; returns the vendor task id.
    pub(crate) async fn create_instance(&self, spec: &DeploySpec<'_>) -> Result<String> {
        let image = self.get_image_record(spec.image_id).await?;
        let (bus, dev) = image
            .disk_devices
            .first()
            .map(|d| (d.bus, d.dev.clone()))
            .ok_or_else(|| anyhow!("image {} has no disk device", spec.image_id))?;

        let mem_bytes = spec.memory_mb * 1024 * 1024;
        let body = json!({
            "deployNum": 1,
            "deployType": 1,
            "isStartNewDomain": true,
            "baseInfo": {
                "name": spec.name,
                "memory": {
                    "currentMemory": mem_bytes,
                    "memory": mem_bytes,
                    "size": mem_bytes,
                },
                "cpu": {
                    "arch": image.cpu_arch,
                    "mode": 3,
                    "current": spec.cpu,
                    "sockets": 1,
                    "cores": 96,
                    "threads": 1,
                },
            },
            "diskDevices": [{
                "bus": bus,
                "dev": dev,
                "source": 4,
                "capacity": spec.sys_disk_capacity,
                "poolName": spec.pool_name,
            }],
            "bridgeInterfaces": [{
                "networkType": 1,
                "model": 1,
                "vpc": {
                    "privateNetId": spec.network_id,
                    "vpcId": spec.vpc_id,
                },
                "ip": spec.ip_addr,
            }],
        });

        let url = format!(
            "/api/compute/domain_templates/{}/deploy/hosts/{}",
            spec.image_id, spec.host_id
        );
        let resp = self.client().post(&url, &body).await?;
        Ok(resp
            .get("taskId")
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default())
    }

    pub async fn change_vm_password(&self, instance_id: &str, user: &str, passwd: &str) -> Result<()> {
        let url = format!("/api/compute/domains/{}/pwd", instance_id);
        self.client()
            .post(&url, &json!({ "user": user, "passwd": passwd }))
            .await?;
        Ok(())
    }
}

impl Host {
    pub(crate) fn new(cluster: Cluster, info: HostInfo) -> Self {
        Self { cluster, info }
    }

    pub fn info(&self) -> &HostInfo {
        &self.info
    }

    fn region(&self) -> &Region {
        self.cluster.region()
    }

    fn instance(&self, info: crate::instance::InstanceInfo) -> Instance {
        Instance::new(self.region().clone(), &self.cluster.info().id, info)
    }

    /// Deploys the VM and waits for it to show up; returns its id.
    async fn deploy(&self, desc: &VmCreateConfig) -> Result<String> {
        let network = self
            .cluster
            .network_by_id(&desc.external_network_id)
            .await?
            .ok_or_else(|| anyhow!("invalid net ID {}", desc.external_network_id))?;

        let region = self.region();
        let image = region
            .get_image_record(&desc.external_image_id)
            .await
            .context("GetImage fail")?;
        if image.status() != CACHED_IMAGE_STATUS_ACTIVE {
            bail!("image {} not ready", desc.external_image_id);
        }

        let mut capacity = image.device_disk_total_capacity;
        if desc.sys_disk.size_gb > 0 && desc.sys_disk.size_gb > image.min_os_disk_size_gb() {
            capacity = desc.sys_disk.size_gb * GIB;
        }
        let storage = self
            .cluster
            .storage_by_id(&desc.sys_disk.storage_external_id)
            .await?;
        // Data disks are placed on the system disk's pool.
        for _ in &desc.data_disks {
            self.cluster
                .storage_by_id(&desc.sys_disk.storage_external_id)
                .await?;
        }

        let spec = DeploySpec {
            name: &desc.name,
            host_id: &self.info.id,
            image_id: &desc.external_image_id,
            cpu: desc.cpu,
            memory_mb: desc.memory_mb,
            network_id: &desc.external_network_id,
            vpc_id: network.vpc_id(),
            sys_disk_capacity: capacity,
            pool_name: &storage.info().name,
            ip_addr: &desc.ip_addr,
        };
        let task_id = region.create_instance(&spec).await.map_err(|e| {
            anyhow!(
                "failed to create specification (c{}.m{}).{}",
                desc.cpu,
                desc.memory_mb,
                e
            )
        })?;
        tracing::info!("Deploying {} on host {} (task {})", desc.name, self.info.id, task_id);

        wait_created(Duration::from_secs(15), Duration::from_secs(300), || {
            let region = region.clone();
            let name = desc.name.clone();
            async move {
                region
                    .get_instance_by_name(&name)
                    .await
                    .ok()
                    .map(|vm| vm.id)
                    .filter(|id| !id.is_empty())
            }
        })
        .await
        .with_context(|| format!("wait for instance {}", desc.name))
    }
}

#[async_trait]
impl CloudResource for Host {
    fn id(&self) -> String {
        self.info.id.clone()
    }

    fn name(&self) -> String {
        self.info.name.clone()
    }

    fn global_id(&self) -> String {
        self.info.id.clone()
    }

    fn status(&self) -> String {
        HOST_STATUS_RUNNING.to_string()
    }
}

#[async_trait]
impl CloudHost for Host {
    async fn list_vms(&self) -> Result<Vec<Box<dyn CloudVm>>> {
        let instances = self.region().instances_by_host(&self.info.id).await?;
        Ok(instances
            .into_iter()
            .map(|info| Box::new(self.instance(info)) as Box<dyn CloudVm>)
            .collect())
    }

    async fn list_wires(&self) -> Result<Vec<Box<dyn CloudWire>>> {
        CloudZone::list_wires(&self.cluster).await
    }

    async fn list_storages(&self) -> Result<Vec<Box<dyn CloudStorage>>> {
        CloudZone::list_storages(&self.cluster).await
    }

    async fn get_storage(&self, id: &str) -> Result<Box<dyn CloudStorage>> {
        CloudZone::get_storage(&self.cluster, id).await
    }

    fn host_status(&self) -> String {
        if self.info.is_connected {
            HOST_ONLINE.to_string()
        } else {
            HOST_OFFLINE.to_string()
        }
    }

    fn access_ip(&self) -> String {
        self.info.ip.clone()
    }

    fn cpu_count(&self) -> i64 {
        self.info.cpu_cores
    }

    fn node_count(&self) -> i64 {
        self.info.cpu_sockets
    }

    fn cpu_desc(&self) -> String {
        self.info.cpu_model_name.clone()
    }

    fn mem_size_mb(&self) -> i64 {
        self.info.memory / 1024 / 1024
    }

    fn storage_size_mb(&self) -> i64 {
        self.info.storage / 1024 / 1024
    }

    fn storage_type(&self) -> String {
        STORAGE_LOCAL_SSD.to_string()
    }

    fn host_type(&self) -> String {
        HYPERVISOR_WINSTACK.to_string()
    }

    fn is_maintenance(&self) -> bool {
        self.info.is_maintain
    }

    async fn create_vm(&self, desc: &VmCreateConfig) -> Result<Box<dyn CloudVm>> {
        let instance_id = self.deploy(desc).await?;
        let vm = self
            .get_vm(&instance_id)
            .await
            .with_context(|| format!("GetIVMById {}", instance_id))?;

        if !desc.external_secgroup_id.is_empty() {
            self.region()
                .assign_security_group(&instance_id, &desc.external_vpc_id, &desc.external_secgroup_id)
                .await
                .with_context(|| {
                    format!(
                        "AssignSecurityGroup instance:{},vpcId:{},secGroupId:{}",
                        instance_id, desc.external_vpc_id, desc.external_secgroup_id
                    )
                })?;
        }
        if !desc.password.is_empty() {
            self.region()
                .change_vm_password(&instance_id, &desc.account, &desc.password)
                .await
                .with_context(|| format!("ChangeVMPassword {} account:{}", instance_id, desc.account))?;
        }
        Ok(vm)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{mock_json, path, test_region};
    use mockito::{Matcher, Server};
    use ocm_common::cloudprovider::*;
    use serde_json::json;

    const HOSTS: &str = r#"{"data":[{"id":"h-1","name":"node1","clusterId":"c-1","cpuCores":32,"isConnected":true,"isMaintain":false,"ip":"10.0.0.11","cpuSockets":2,"cpuModelName":"Xeon Gold","memory":68719476736,"storage":1099511627776}]}"#;

    async fn host(server: &mut mockito::ServerGuard) -> Box<dyn CloudHost> {
        let region = test_region(server).await;
        mock_json(
            server,
            "GET",
            "/api/compute/clusters",
            r#"{"data":[{"id":"c-1","name":"east"}]}"#,
        )
        .await;
        mock_json(server, "GET", "/api/compute/hosts", HOSTS).await;
        region.get_host("h-1").await.unwrap()
    }

    #[tokio::test]
    async fn test_host_attributes() {
        let mut server = Server::new_async().await;
        let host = host(&mut server).await;

        assert_eq!(host.status(), "running");
        assert_eq!(host.host_status(), "online");
        assert_eq!(host.access_ip(), "10.0.0.11");
        assert_eq!(host.cpu_count(), 32);
        assert_eq!(host.node_count(), 2);
        assert_eq!(host.cpu_desc(), "Xeon Gold");
        assert_eq!(host.mem_size_mb(), 65536);
        assert_eq!(host.storage_size_mb(), 1048576);
        assert_eq!(host.storage_type(), "local_ssd");
        assert_eq!(host.host_type(), "winstack");
        assert!(!host.is_maintenance());
        assert!(ocm_common::is_not_supported(
            &host.list_host_nics().await.err().unwrap()
        ));
    }

    #[tokio::test]
    async fn test_create_vm_rejects_unknown_network() {
        let mut server = Server::new_async().await;
        let host = host(&mut server).await;
        mock_json(&mut server, "GET", "/api/network/vpcs", r#"{"data":[{"id":"vpc-1","name":"prod"}]}"#).await;
        mock_json(&mut server, "GET", "/api/network/vpcs/vpc-1/networks", "[]").await;

        let desc = VmCreateConfig {
            name: "web-1".to_string(),
            external_network_id: "net-x".to_string(),
            ..Default::default()
        };
        let err = host.create_vm(&desc).await.err().unwrap();
        assert_eq!(err.to_string(), "invalid net ID net-x");
    }

    #[tokio::test]
    async fn test_create_vm_deploys_and_sets_password() {
        let mut server = Server::new_async().await;
        let host = host(&mut server).await;
        mock_json(&mut server, "GET", "/api/network/vpcs", r#"{"data":[{"id":"vpc-1","name":"prod"}]}"#).await;
        mock_json(
            &mut server,
            "GET",
            "/api/network/vpcs/vpc-1/networks",
            r#"[{"id":"net-1","name":"web","cidr":"192.168.1.0/24","ipRange":"192.168.1.10-192.168.1.200","gateway":"192.168.1.1"}]"#,
        )
        .await;
        mock_json(
            &mut server,
            "GET",
            "/api/compute/domain_templates",
            r#"{"data":[{"id":"img-1","name":"centos7"}]}"#,
        )
        .await;
        mock_json(
            &mut server,
            "GET",
            "/api/compute/domain_templates/img-1",
            r#"{"deviceDiskTotalCapacity":21474836480,"cpuArch":2,"osType":1,"diskDevices":[{"bus":2,"dev":"vda","capacity":21474836480}],"domainMemoryResp":{"currentMemory":1073741824}}"#,
        )
        .await;
        mock_json(
            &mut server,
            "GET",
            "/api/storage/storagePools",
            r#"{"data":[{"id":"sp-1","name":"ssd-pool","status":2,"storageType":5}]}"#,
        )
        .await;
        let deploy = server
            .mock("POST", "/api/compute/domain_templates/img-1/deploy/hosts/h-1")
            .match_body(Matcher::PartialJson(json!({
                "deployNum": 1,
                "baseInfo": {
                    "name": "web-1",
                    "memory": {"size": 2147483648i64},
                    "cpu": {"arch": 2, "current": 2, "cores": 96},
                },
                "diskDevices": [{"bus": 2, "dev": "vda", "source": 4, "capacity": 42949672960i64, "poolName": "ssd-pool"}],
                "bridgeInterfaces": [{"vpc": {"privateNetId": "net-1", "vpcId": "vpc-1"}, "ip": "192.168.1.20"}],
            })))
            .with_status(200)
            .with_body(r#"{"taskId":"task-9"}"#)
            .create_async()
            .await;
        let _domains = server
            .mock("GET", path("/api/compute/domains"))
            .with_status(200)
            .with_body(r#"{"data":[{"id":"vm-1","name":"web-1","status":1,"vCpu":2,"memory":2147483648}]}"#)
            .create_async()
            .await;
        let pwd = server
            .mock("POST", "/api/compute/domains/vm-1/pwd")
            .match_body(Matcher::Json(json!({"user": "root", "passwd": "S3cret!"})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let desc = VmCreateConfig {
            name: "web-1".to_string(),
            external_image_id: "img-1".to_string(),
            sys_disk: DiskInfo {
                storage_external_id: "sp-1".to_string(),
                size_gb: 40,
                ..Default::default()
            },
            cpu: 2,
            memory_mb: 2048,
            external_network_id: "net-1".to_string(),
            external_vpc_id: "vpc-1".to_string(),
            ip_addr: "192.168.1.20".to_string(),
            account: "root".to_string(),
            password: "S3cret!".to_string(),
            ..Default::default()
        };
        let vm = host.create_vm(&desc).await.unwrap();
        assert_eq!(vm.global_id(), "vm-1");
        assert_eq!(vm.status(), "running");
        deploy.assert_async().await;
        pwd.assert_async().await;
    }
}
