use crate::client::{decode_list, paginate, PageQuery};
use crate::disk::{Disk, StorageVolume};
use crate::region::Region;
use crate::storage_cache::StorageCache;
use anyhow::Result;
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::*;
use ocm_common::CloudError;
use serde::Deserialize;

const STORAGE_LIST_URL: &str = "/api/storage/storagePools";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    FcSan,
    IpSan,
    Nas,
    Ceph,
    Local,
    Nvme,
    Unknown,
}

impl StorageKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => StorageKind::FcSan,
            2 => StorageKind::IpSan,
            3 => StorageKind::Nas,
            4 => StorageKind::Ceph,
            5 => StorageKind::Local,
            6 => StorageKind::Nvme,
            _ => StorageKind::Unknown,
        }
    }
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StorageKind::FcSan => "FC-SAN",
            StorageKind::IpSan => "IP-SAN",
            StorageKind::Nas => "NAS",
            StorageKind::Ceph => "CEPH",
            StorageKind::Local => "Local",
            StorageKind::Nvme => "NVME",
            StorageKind::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
    #[serde(deserialize_with = "crate::de::int")]
    pub status: i64,
    #[serde(deserialize_with = "crate::de::int")]
    pub storage_type: i64,
    /// KiB.
    #[serde(deserialize_with = "crate::de::int")]
    pub capacity: i64,
    #[serde(deserialize_with = "crate::de::int")]
    pub allocation: i64,
    /// KiB.
    #[serde(deserialize_with = "crate::de::int")]
    pub used_capacity: i64,
}

/// A storage pool as seen from one cluster.
#[derive(Clone)]
pub struct Storage {
    region: Region,
    zone_id: String,
    info: StorageInfo,
}

impl Region {
    pub async fn get_storages(&self, id: &str, start: i64, size: i64) -> Result<Vec<StorageInfo>> {
        let query = PageQuery::new(start, size).id("id", id);
        let resp = self.client().get(STORAGE_LIST_URL, &query.params()).await?;
        decode_list(resp, "data")
    }

    pub async fn storages(&self) -> Result<Vec<StorageInfo>> {
        paginate(|start, size| self.get_storages("", start, size)).await
    }

    pub async fn get_storage_record(&self, id: &str) -> Result<StorageInfo> {
        self.get_storages(id, 0, 0)
            .await?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| CloudError::not_found(id).into())
    }
}

impl Storage {
    pub(crate) fn new(region: Region, zone_id: &str, info: StorageInfo) -> Self {
        Self {
            region,
            zone_id: zone_id.to_string(),
            info,
        }
    }

    pub fn info(&self) -> &StorageInfo {
        &self.info
    }

    pub async fn get_disks(&self, id: &str, start: i64, size: i64) -> Result<Vec<StorageVolume>> {
        let url = format!("{}/{}/storageVolumes", STORAGE_LIST_URL, self.info.id);
        let query = PageQuery::new(start, size).id("id", id);
        let resp = self.region.client().get(&url, &query.params()).await?;
        decode_list(resp, "data")
    }

    pub async fn volumes(&self) -> Result<Vec<StorageVolume>> {
        paginate(|start, size| self.get_disks("", start, size)).await
    }

    pub(crate) async fn disk_by_id(&self, id: &str) -> Result<Disk> {
        self.volumes()
            .await?
            .into_iter()
            .find(|d| d.id == id)
            .map(|info| Disk::new(&self.info.id, info))
            .ok_or_else(|| CloudError::not_found(id).into())
    }
}

#[async_trait]
impl CloudResource for Storage {
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
        if self.info.status == 2 {
            STORAGE_ONLINE.to_string()
        } else {
            STORAGE_OFFLINE.to_string()
        }
    }
}

#[async_trait]
impl CloudStorage for Storage {
    fn storagecache(&self) -> Box<dyn CloudStoragecache> {
        Box::new(StorageCache::new(
            self.region.clone(),
            &self.info.id,
            &self.info.name,
        ))
    }

    fn zone_id(&self) -> String {
        self.zone_id.clone()
    }

    fn storage_type(&self) -> String {
        StorageKind::from_code(self.info.storage_type).to_string()
    }

    fn medium_type(&self) -> String {
        DISK_TYPE_SSD.to_string()
    }

    fn capacity_mb(&self) -> i64 {
        self.info.capacity / 1024
    }

    fn capacity_used_mb(&self) -> i64 {
        self.info.used_capacity / 1024
    }

    async fn list_disks(&self) -> Result<Vec<Box<dyn CloudDisk>>> {
        Ok(self
            .volumes()
            .await?
            .into_iter()
            .map(|info| Box::new(Disk::new(&self.info.id, info)) as Box<dyn CloudDisk>)
            .collect())
    }

    async fn get_disk(&self, id: &str) -> Result<Box<dyn CloudDisk>> {
        Ok(Box::new(self.disk_by_id(id).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mock_json, test_region};
    use mockito::Server;

    #[test]
    fn test_storage_kind_names() {
        assert_eq!(StorageKind::from_code(1).to_string(), "FC-SAN");
        assert_eq!(StorageKind::from_code(4).to_string(), "CEPH");
        assert_eq!(StorageKind::from_code(6).to_string(), "NVME");
        assert_eq!(StorageKind::from_code(0).to_string(), "Unknown");
    }

    #[tokio::test]
    async fn test_storage_attributes_and_disks() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        mock_json(
            &mut server,
            "GET",
            "/api/storage/storagePools",
            r#"{"data":[{"id":"sp-1","name":"ceph-a","status":2,"storageType":4,"capacity":10485760,"usedCapacity":2097152},{"id":"sp-2","name":"nas","status":1,"storageType":3}]}"#,
        )
        .await;
        mock_json(
            &mut server,
            "GET",
            "/api/storage/storagePools/sp-1/storageVolumes",
            r#"{"data":[{"id":"vol-1","name":"web-1-sys","status":1,"type":1,"capacity":21474836480,"path":"/pool/vol-1"}]}"#,
        )
        .await;

        let infos = region.storages().await.unwrap();
        let storages: Vec<Storage> = infos
            .into_iter()
            .map(|info| Storage::new(region.clone(), "c-1", info))
            .collect();
        let ceph = &storages[0];
        assert_eq!(ceph.status(), "online");
        assert_eq!(storages[1].status(), "offline");
        assert_eq!(ceph.storage_type(), "CEPH");
        assert_eq!(ceph.medium_type(), "ssd");
        assert_eq!(ceph.capacity_mb(), 10240);
        assert_eq!(ceph.capacity_used_mb(), 2048);
        assert_eq!(ceph.zone_id(), "c-1");
        assert!(ceph.is_sys_disk_store());
        assert_eq!(ceph.storagecache().global_id(), "WinStack/pool-1-sp-1");

        let disks = ceph.list_disks().await.unwrap();
        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0].disk_size_mb(), 20480);
        let disk = ceph.get_disk("vol-1").await.unwrap();
        assert_eq!(disk.access_path(), "/pool/vol-1");
        assert!(ocm_common::is_not_found(&ceph.get_disk("vol-9").await.err().unwrap()));
    }
}
