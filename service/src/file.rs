use std::sync::Arc;

use chunk::{ByteStream, Chunk, ChunkManager};
use futures::future::join_all;
use registry::{ServerRegistry, StorageServer};
use storage::StorageClient;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{ChunkInfo, FileMetadata, MetadataStore, Result, ServiceError};

/// End-to-end upload/download coordination: file identity, server
/// selection, chunk fan-out across the storage client, and the
/// metadata record tying chunks back to a logical file.
#[derive(Clone)]
pub struct FileService {
    registry: Arc<dyn ServerRegistry>,
    client: Arc<dyn StorageClient>,
    metadata_store: Arc<dyn MetadataStore>,
    chunk_manager: ChunkManager,
    chunk_count: usize,
}

impl FileService {
    pub fn new(
        registry: Arc<dyn ServerRegistry>,
        client: Arc<dyn StorageClient>,
        metadata_store: Arc<dyn MetadataStore>,
        chunk_count: usize,
    ) -> Self {
        let chunk_count = chunk_count.max(1);
        Self {
            registry,
            client,
            metadata_store,
            chunk_manager: ChunkManager::new(chunk_count),
            chunk_count,
        }
    }

    /// Shards `source` across the selected servers and returns the new
    /// file id. Nothing of a failed attempt survives: any store or
    /// metadata failure triggers best-effort deletion of every chunk,
    /// and the metadata record is only saved once all chunks are
    /// durably stored.
    pub async fn upload(&self, source: ByteStream, size: u64) -> Result<String> {
        // The attempt runs in its own task: a caller that disconnects
        // mid-upload detaches from it, while the attempt itself still
        // settles and cleans up after itself.
        let service = self.clone();
        tokio::spawn(async move { service.run_upload(source, size).await })
            .await
            .map_err(|err| ServiceError::Task(err.to_string()))?
    }

    async fn run_upload(&self, source: ByteStream, size: u64) -> Result<String> {
        // Random ids stay collision-free under concurrent uploads,
        // unlike anything derived from wall-clock time.
        let file_id = Uuid::new_v4().simple().to_string();

        let servers = self.registry.select_servers(self.chunk_count).await?;

        let chunks = self.chunk_manager.split(source, size, &file_id);
        debug!(file = %file_id, chunks = chunks.len(), size, "split file into chunks");

        // Placement recorded up front so cleanup can target every
        // chunk of the attempt, including ones that stored fine.
        let placements: Vec<ChunkInfo> = chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| ChunkInfo {
                id: chunk.id.clone(),
                server: servers[i % servers.len()].id.clone(),
                size: chunk.size,
            })
            .collect();

        if let Err(err) = self.store_chunks(chunks, &servers).await {
            self.cleanup_chunks(&placements, &servers);
            return Err(err);
        }
        debug!(file = %file_id, "all chunks stored");

        let metadata = FileMetadata {
            id: file_id.clone(),
            size,
            chunks: placements.clone(),
        };
        if let Err(err) = self.metadata_store.save(metadata).await {
            self.cleanup_chunks(&placements, &servers);
            return Err(err);
        }

        Ok(file_id)
    }

    /// Reassembles a previously uploaded file as one ordered stream of
    /// exactly `size` bytes. Every chunk retrieval completes before a
    /// single byte is produced; any failure yields only an error.
    pub async fn download(&self, file_id: &str) -> Result<(ByteStream, u64)> {
        let metadata = self.metadata_store.load(file_id).await?;

        let mut tasks: Vec<JoinHandle<storage::Result<ByteStream>>> =
            Vec::with_capacity(metadata.chunks.len());
        for info in &metadata.chunks {
            let client = Arc::clone(&self.client);
            // The client resolves a node by its id; the address is not
            // persisted in metadata.
            let server = StorageServer::new(info.server.clone(), "");
            let chunk_id = info.id.clone();
            tasks.push(tokio::spawn(async move {
                client.retrieve_chunk(&server, &chunk_id).await
            }));
        }

        let mut readers = Vec::with_capacity(metadata.chunks.len());
        let mut first_error = None;
        for result in join_all(tasks).await {
            match result {
                Ok(Ok(reader)) => readers.push(reader),
                Ok(Err(err)) => {
                    first_error.get_or_insert(ServiceError::Storage(err));
                }
                Err(err) => {
                    first_error.get_or_insert(ServiceError::Task(err.to_string()));
                }
            }
        }
        if let Some(err) = first_error {
            // readers obtained so far drop here, closing their streams
            return Err(err);
        }

        debug!(file = %file_id, chunks = readers.len(), "reassembling file");
        Ok((self.chunk_manager.join(readers), metadata.size))
    }

    /// One store task per chunk, joined by a barrier: the outcome is
    /// decided only after every task finished, so a failure can still
    /// clean up the chunks that made it.
    async fn store_chunks(&self, chunks: Vec<Chunk>, servers: &[StorageServer]) -> Result<()> {
        let mut tasks: Vec<JoinHandle<storage::Result<()>>> = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.into_iter().enumerate() {
            let client = Arc::clone(&self.client);
            let server = servers[i % servers.len()].clone();
            tasks.push(tokio::spawn(async move {
                client.store_chunk(&server, &chunk.id, chunk.data).await
            }));
        }

        let mut first_error = None;
        for result in join_all(tasks).await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    first_error.get_or_insert(ServiceError::Storage(err));
                }
                Err(err) => {
                    first_error.get_or_insert(ServiceError::Task(err.to_string()));
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Best-effort removal of every chunk of a failed attempt. The
    /// deletes run detached from the request, so a disconnected caller
    /// still gets its orphan chunks removed. Failures are logged and
    /// never surfaced or retried.
    fn cleanup_chunks(&self, placements: &[ChunkInfo], servers: &[StorageServer]) {
        for (i, info) in placements.iter().enumerate() {
            let client = Arc::clone(&self.client);
            let server = servers[i % servers.len()].clone();
            let chunk_id = info.id.clone();
            tokio::spawn(async move {
                if let Err(err) = client.delete_chunk(&server, &chunk_id).await {
                    warn!(server = %server.id, chunk = %chunk_id, error = %err, "cleanup delete failed");
                }
            });
        }
    }
}
