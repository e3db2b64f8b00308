mod memory;

pub use memory::MemoryClient;

use async_trait::async_trait;
use chunk::ByteStream;
use registry::StorageServer;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("chunk not found: {0}")]
    ChunkNotFound(String),

    #[error("chunk stream failed: {0}")]
    Stream(#[from] chunk::StreamError),

    #[error("storage node error: {0}")]
    Node(String),
}

/// Store/retrieve/delete of one chunk against one storage server.
///
/// Implementations must be safe to call concurrently across distinct
/// `(server, chunk)` pairs and serialize calls on the same pair. The
/// contract carries no retry policy; a retrying wrapper can implement
/// the trait over an inner client.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Fully drains `data` and persists it under `(server.id, chunk_id)`.
    /// Chunk ids are unique per upload, so overwriting an existing key
    /// is last-write-wins.
    async fn store_chunk(
        &self,
        server: &StorageServer,
        chunk_id: &str,
        data: ByteStream,
    ) -> Result<()>;

    /// Stream over the stored chunk from byte 0, independent of the
    /// original upload's lifetime.
    async fn retrieve_chunk(&self, server: &StorageServer, chunk_id: &str) -> Result<ByteStream>;

    /// Idempotent: deleting an unknown chunk succeeds.
    async fn delete_chunk(&self, server: &StorageServer, chunk_id: &str) -> Result<()>;
}
