//! The blob-storage collaborator interface.

use crate::StoreError;
use async_trait::async_trait;
use medaudit_core::FileMetadata;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Abstract binary storage for dossier files.
///
/// Uploads return a publicly resolvable URL; files are never deleted through
/// this workflow.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<FileMetadata, StoreError>;
}

/// In-memory blob storage handing out stable fake URLs.
#[derive(Debug)]
pub struct MemoryBlobStorage {
    base_url: String,
    stored: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            stored: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.stored.read().await.len()
    }
}

impl Default for MemoryBlobStorage {
    fn default() -> Self {
        Self::new("memory://medical-documents")
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<FileMetadata, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::Upload("file name is required".into()));
        }
        let key = format!("{}-{}", Uuid::new_v4(), name);
        let size = bytes.len() as u64;
        let url = format!("{}/{}", self.base_url, key);
        self.stored.write().await.insert(key, bytes);
        Ok(FileMetadata {
            name: name.to_owned(),
            size,
            content_type: content_type.to_owned(),
            url: Some(url),
        })
    }
}
