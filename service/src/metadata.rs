use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{FileMetadata, Result, ServiceError};

/// Durable record store for file metadata. A record must only become
/// loadable once saved in full; `FileService` saves after every chunk
/// of the file is stored, which gives readers all-or-nothing
/// visibility of a file id.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn save(&self, metadata: FileMetadata) -> Result<()>;

    async fn load(&self, file_id: &str) -> Result<FileMetadata>;
}

/// In-memory metadata store, standing in until a durable backend is
/// wired up behind the same trait.
#[derive(Default)]
pub struct MemoryMetadataStore {
    records: RwLock<HashMap<String, FileMetadata>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, file_id: &str) -> bool {
        self.records.read().await.contains_key(file_id)
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn save(&self, metadata: FileMetadata) -> Result<()> {
        self.records
            .write()
            .await
            .insert(metadata.id.clone(), metadata);
        Ok(())
    }

    async fn load(&self, file_id: &str) -> Result<FileMetadata> {
        self.records
            .read()
            .await
            .get(file_id)
            .cloned()
            .ok_or_else(|| ServiceError::FileNotFound(file_id.to_string()))
    }
}
