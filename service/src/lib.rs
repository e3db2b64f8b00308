mod file;
mod metadata;

pub use file::FileService;
pub use metadata::{MemoryMetadataStore, MetadataStore};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Capacity(#[from] registry::RegistryError),

    #[error(transparent)]
    Storage(#[from] storage::StorageError),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("metadata store error: {0}")]
    Metadata(String),

    #[error("chunk task failed: {0}")]
    Task(String),
}

/// Durable placement record for one chunk. Its position in the parent
/// `FileMetadata` list is the chunk's index in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkInfo {
    pub id: String,
    pub server: String,
    pub size: u64,
}

/// Reconstruction map for a whole file: ordered, contiguous chunk
/// placements whose sizes sum to `size`. Saved only after every chunk
/// is durably stored, and read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub id: String,
    pub size: u64,
    pub chunks: Vec<ChunkInfo>,
}
