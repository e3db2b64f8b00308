mod round_robin;

pub use round_robin::RoundRobinRegistry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("not enough storage servers: have {available}, need {requested}")]
    InsufficientServers { available: usize, requested: usize },
}

/// A registered storage node. Immutable once registered; identity is
/// the id. `weight` is reserved for weighted selection strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageServer {
    pub id: String,
    pub address: String,
    pub weight: u32,
}

impl StorageServer {
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            weight: 1,
        }
    }
}

/// Pool of available storage servers with a pluggable selection
/// strategy (round robin today, weighted or hash-based later).
#[async_trait]
pub trait ServerRegistry: Send + Sync {
    async fn register(&self, server: StorageServer);

    /// Ordered subset of the pool for one upload. Fails without
    /// touching the pool when fewer than `count` servers are
    /// registered.
    async fn select_servers(&self, count: usize) -> Result<Vec<StorageServer>>;
}
