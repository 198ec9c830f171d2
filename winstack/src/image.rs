use crate::client::{decode_list, paginate, PageQuery};
use crate::instance::{os_arch_name, os_type_from_code};
use crate::region::Region;
use anyhow::{Context, Result};
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::CACHED_IMAGE_STATUS_ACTIVE;
use ocm_common::CloudError;
use serde::Deserialize;
use serde_json::Value;

const IMAGE_LIST_URL: &str = "/api/compute/domain_templates";
const GIB: i64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateDisk {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub vol_name: String,
    #[serde(deserialize_with = "crate::de::int")]
    pub capacity: i64,
    #[serde(deserialize_with = "crate::de::int")]
    pub bus: i64,
    #[serde(deserialize_with = "crate::de::string")]
    pub dev: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateMemory {
    /// Bytes.
    #[serde(deserialize_with = "crate::de::int")]
    pub current_memory: i64,
    #[serde(deserialize_with = "crate::de::int")]
    pub memory: i64,
}

/// A domain template, the WinStack equivalent of an image.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageInfo {
    #[serde(deserialize_with = "crate::de::string")]
    pub id: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub name: String,
    #[serde(deserialize_with = "crate::de::string")]
    pub storage_id: String,
    /// Bytes across all template disks.
    #[serde(deserialize_with = "crate::de::int")]
    pub device_disk_total_capacity: i64,
    #[serde(deserialize_with = "crate::de::int")]
    pub os_type: i64,
    #[serde(deserialize_with = "crate::de::string")]
    pub os_version: String,
    #[serde(deserialize_with = "crate::de::int")]
    pub share: i64,
    #[serde(deserialize_with = "crate::de::int")]
    pub cpu_current: i64,
    #[serde(deserialize_with = "crate::de::int")]
    pub cpu_arch: i64,
    pub disk_devices: Vec<TemplateDisk>,
    pub domain_memory_resp: TemplateMemory,
}

impl ImageInfo {
    pub fn status(&self) -> &'static str {
        CACHED_IMAGE_STATUS_ACTIVE
    }

    pub fn min_os_disk_size_gb(&self) -> i64 {
        self.device_disk_total_capacity / GIB
    }
}

/// Overlay the keys of `detail` onto `base`.
fn merge_detail(base: &mut Value, detail: Value) {
    if let (Value::Object(base), Value::Object(detail)) = (base, detail) {
        for (k, v) in detail {
            base.insert(k, v);
        }
    }
}

impl Region {
    /// One page of templates, each merged with its detail record.
    pub async fn get_images(&self, id: &str, start: i64, size: i64) -> Result<Vec<ImageInfo>> {
        let query = PageQuery::new(start, size).id("id", id);
        let resp = self.client().get(IMAGE_LIST_URL, &query.params()).await?;
        let mut entries: Vec<Value> = decode_list(resp, "data")?;
        for entry in entries.iter_mut() {
            let Some(image_id) = entry.get("id").and_then(Value::as_str).map(str::to_string)
            else {
                continue;
            };
            match self
                .client()
                .get(&format!("{}/{}", IMAGE_LIST_URL, image_id), &[])
                .await
            {
                Ok(detail) => merge_detail(entry, detail),
                Err(e) => tracing::debug!("Skipping detail of template {}: {:#}", image_id, e),
            }
        }
        entries
            .into_iter()
            .map(|e| serde_json::from_value(e).context("Failed to decode template"))
            .collect()
    }

    pub async fn image_records(&self) -> Result<Vec<ImageInfo>> {
        paginate(|start, size| self.get_images("", start, size)).await
    }

    pub async fn get_image_record(&self, id: &str) -> Result<ImageInfo> {
        self.image_records()
            .await?
            .into_iter()
            .find(|img| img.id == id)
            .ok_or_else(|| CloudError::not_found(id).into())
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    cache_id: String,
    info: ImageInfo,
}

impl Image {
    pub(crate) fn new(cache_id: &str, info: ImageInfo) -> Self {
        Self {
            cache_id: cache_id.to_string(),
            info,
        }
    }

    pub fn storagecache_id(&self) -> &str {
        &self.cache_id
    }
}

#[async_trait]
impl CloudResource for Image {
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
        self.info.status().to_string()
    }
}

#[async_trait]
impl CloudImage for Image {
    fn size_byte(&self) -> i64 {
        self.info.device_disk_total_capacity
    }

    fn image_type(&self) -> ImageType {
        ImageType::Customized
    }

    fn image_status(&self) -> String {
        CACHED_IMAGE_STATUS_ACTIVE.to_string()
    }

    fn os_type(&self) -> OsType {
        os_type_from_code(self.info.os_type)
    }

    fn os_version(&self) -> String {
        self.info.os_version.clone()
    }

    fn os_arch(&self) -> String {
        os_arch_name(self.info.cpu_arch).to_string()
    }

    fn min_os_disk_size_gb(&self) -> i64 {
        self.info.min_os_disk_size_gb()
    }

    fn min_ram_size_mb(&self) -> i64 {
        self.info.domain_memory_resp.current_memory / 1024 / 1024
    }

    fn image_format(&self) -> String {
        "raw".to_string()
    }

    fn uefi(&self) -> bool {
        true
    }

    fn public_scope(&self) -> PublicScope {
        if self.info.share == 2 {
            PublicScope::System
        } else {
            PublicScope::Domain
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage_cache::StorageCache;
    use crate::test_support::{mock_json, test_region};
    use mockito::Server;

    #[tokio::test]
    async fn test_images_merge_detail_and_skip_failures() {
        let mut server = Server::new_async().await;
        let region = test_region(&mut server).await;
        mock_json(
            &mut server,
            "GET",
            "/api/compute/domain_templates",
            r#"{"data":[{"id":"img-1","name":"centos7","osType":1},{"id":"img-2","name":"win2019","osType":2,"share":2}]}"#,
        )
        .await;
        mock_json(
            &mut server,
            "GET",
            "/api/compute/domain_templates/img-1",
            r#"{"deviceDiskTotalCapacity":42949672960,"osVersion":"7.9","cpuArch":2,"domainMemoryResp":{"currentMemory":2147483648}}"#,
        )
        .await;
        let _broken = server
            .mock("GET", "/api/compute/domain_templates/img-2")
            .with_status(500)
            .create_async()
            .await;

        let cache = StorageCache::new(region.clone(), "sp-1", "ssd");
        let images = cache.list_images().await.unwrap();
        assert_eq!(images.len(), 2);

        let centos = &images[0];
        assert_eq!(centos.name(), "centos7");
        assert_eq!(centos.size_byte(), 42949672960);
        assert_eq!(centos.min_os_disk_size_gb(), 40);
        assert_eq!(centos.min_ram_size_mb(), 2048);
        assert_eq!(centos.os_type(), OsType::Linux);
        assert_eq!(centos.os_version(), "7.9");
        assert_eq!(centos.os_arch(), "x86_64");
        assert_eq!(centos.image_type(), ImageType::Customized);
        assert_eq!(centos.public_scope(), PublicScope::Domain);
        assert_eq!(centos.image_format(), "raw");
        assert!(centos.uefi());

        let windows = &images[1];
        assert_eq!(windows.os_type(), OsType::Windows);
        assert_eq!(windows.public_scope(), PublicScope::System);
        assert_eq!(windows.size_byte(), 0);

        let img = cache.get_image("img-2").await.unwrap();
        assert_eq!(img.status(), "active");
        assert!(ocm_common::is_not_found(&cache.get_image("img-9").await.err().unwrap()));
    }
}
