use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::*;
use serde::Deserialize;

/// One entry of a pool's `storageVolumes` list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageVolume {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
    #[serde(deserialize_with = "crate::de::int")]
    pub status: i64,
    #[serde(rename = "type", deserialize_with = "crate::de::int")]
    pub kind: i64,
    /// Bytes.
    #[serde(deserialize_with = "crate::de::int")]
    pub capacity: i64,
    #[serde(deserialize_with = "crate::de::int")]
    pub allocation: i64,
    #[serde(deserialize_with = "crate::de::string")]
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct Disk {
    storage_id: String,
    info: StorageVolume,
}

impl Disk {
    pub(crate) fn new(storage_id: &str, info: StorageVolume) -> Self {
        Self {
            storage_id: storage_id.to_string(),
            info,
        }
    }
}

#[async_trait]
impl CloudResource for Disk {
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
        match self.info.status {
            1 => DISK_READY,
            _ => DISK_UNKNOWN,
        }
        .to_string()
    }
}

#[async_trait]
impl CloudDisk for Disk {
    fn storage_id(&self) -> String {
        self.storage_id.clone()
    }

    fn disk_format(&self) -> String {
        match self.info.kind {
            1 => "qcow2",
            2 => "raw",
            3 => "iso",
            _ => "",
        }
        .to_string()
    }

    fn disk_size_mb(&self) -> i64 {
        self.info.capacity / 1024 / 1024
    }

    fn disk_type(&self) -> String {
        DISK_TYPE_SYS.to_string()
    }

    fn driver(&self) -> String {
        "scsi".to_string()
    }

    fn cache_mode(&self) -> String {
        "none".to_string()
    }

    fn access_path(&self) -> String {
        self.info.path.clone()
    }
}
