//! In-memory image storage for development and tests.
//!
//! Objects are stored as uploaded; images are keyed with a `.webp` suffix
//! like the optimized uploads the hosted bucket receives.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use scribe_core::domain::StorageTarget;
use scribe_core::ports::{ImageStorage, StorageError};

#[derive(Default)]
pub struct InMemoryImageStorage {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    deletions: RwLock<Vec<(String, String)>>,
}

impl InMemoryImageStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored in a bucket, sorted.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .await
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, key)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Every delete request received, as `(bucket, key)`, in order.
    pub async fn deletions(&self) -> Vec<(String, String)> {
        self.deletions.read().await.clone()
    }
}

#[async_trait]
impl ImageStorage for InMemoryImageStorage {
    async fn upload(
        &self,
        target: &StorageTarget,
        bytes: Vec<u8>,
        key_prefix: &str,
    ) -> Result<String, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::Upload("empty image".to_string()));
        }
        let key = format!("{key_prefix}.webp");
        self.objects
            .write()
            .await
            .insert((target.bucket.clone(), key.clone()), bytes);
        tracing::debug!(bucket = %target.bucket, %key, "Image stored");
        Ok(key)
    }

    async fn delete(&self, target: &StorageTarget, key: &str) -> Result<(), StorageError> {
        self.deletions
            .write()
            .await
            .push((target.bucket.clone(), key.to_string()));

        let removed = self
            .objects
            .write()
            .await
            .remove(&(target.bucket.clone(), key.to_string()));
        if removed.is_none() {
            tracing::warn!(bucket = %target.bucket, %key, "Image to delete was not stored");
        }
        Ok(())
    }
}
