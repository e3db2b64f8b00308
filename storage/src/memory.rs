use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chunk::ByteStream;
use registry::StorageServer;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{Result, StorageClient, StorageError};

/// In-memory stand-in for a networked storage-node client. The map is
/// guarded by a reader/writer lock: stores and deletes take the write
/// guard, retrievals share the read guard.
#[derive(Default)]
pub struct MemoryClient {
    chunks: RwLock<HashMap<(String, String), Bytes>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn chunk_count(&self) -> usize {
        self.chunks.read().await.len()
    }
}

#[async_trait]
impl StorageClient for MemoryClient {
    async fn store_chunk(
        &self,
        server: &StorageServer,
        chunk_id: &str,
        data: ByteStream,
    ) -> Result<()> {
        // drain before taking the lock; the stream may be slow
        let bytes = data.collect().await?;
        debug!(server = %server.id, chunk = chunk_id, size = bytes.len(), "stored chunk");
        self.chunks
            .write()
            .await
            .insert((server.id.clone(), chunk_id.to_string()), bytes);
        Ok(())
    }

    async fn retrieve_chunk(&self, server: &StorageServer, chunk_id: &str) -> Result<ByteStream> {
        let chunks = self.chunks.read().await;
        match chunks.get(&(server.id.clone(), chunk_id.to_string())) {
            Some(bytes) => Ok(ByteStream::from_bytes(bytes.clone())),
            None => Err(StorageError::ChunkNotFound(format!(
                "{}/{}",
                server.id, chunk_id
            ))),
        }
    }

    async fn delete_chunk(&self, server: &StorageServer, chunk_id: &str) -> Result<()> {
        self.chunks
            .write()
            .await
            .remove(&(server.id.clone(), chunk_id.to_string()));
        debug!(server = %server.id, chunk = chunk_id, "deleted chunk");
        Ok(())
    }
}
