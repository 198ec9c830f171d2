use crate::image::Image;
use crate::region::Region;
use anyhow::Result;
use async_trait::async_trait;
use ocm_common::cloudprovider::*;
use ocm_common::consts::STORAGECACHE_STATUS_AVAILABLE;

/// Image cache of a storage pool. WinStack templates are region-wide, so
/// every pool's cache lists the same images.
#[derive(Clone)]
pub struct StorageCache {
    region: Region,
    storage_id: String,
    storage_name: String,
}

impl StorageCache {
    pub(crate) fn new(region: Region, storage_id: &str, storage_name: &str) -> Self {
        Self {
            region,
            storage_id: storage_id.to_string(),
            storage_name: storage_name.to_string(),
        }
    }
}

#[async_trait]
impl CloudResource for StorageCache {
    fn id(&self) -> String {
        format!("{}-{}", self.region.global_id(), self.storage_id)
    }

    fn name(&self) -> String {
        self.storage_name.clone()
    }

    fn global_id(&self) -> String {
        self.id()
    }

    fn status(&self) -> String {
        STORAGECACHE_STATUS_AVAILABLE.to_string()
    }
}

#[async_trait]
impl CloudStoragecache for StorageCache {
    async fn list_images(&self) -> Result<Vec<Box<dyn CloudImage>>> {
        let cache_id = self.id();
        Ok(self
            .region
            .image_records()
            .await?
            .into_iter()
            .map(|info| Box::new(Image::new(&cache_id, info)) as Box<dyn CloudImage>)
            .collect())
    }

    async fn get_image(&self, id: &str) -> Result<Box<dyn CloudImage>> {
        let info = self.region.get_image_record(id).await?;
        Ok(Box::new(Image::new(&self.id(), info)))
    }
}
