//! Image object storage port.

use async_trait::async_trait;

use crate::domain::StorageTarget;

#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Store `bytes` under a key derived from `key_prefix` and return the final key.
    async fn upload(
        &self,
        target: &StorageTarget,
        bytes: Vec<u8>,
        key_prefix: &str,
    ) -> Result<String, StorageError>;

    /// Remove a stored object.
    async fn delete(&self, target: &StorageTarget, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Delete failed: {0}")]
    Delete(String),
}
