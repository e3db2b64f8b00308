use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{RegistryError, Result, ServerRegistry, StorageServer};

#[derive(Default)]
struct Pool {
    servers: Vec<StorageServer>,
    cursor: usize,
}

/// Round-robin selection over the registered pool. Each call takes
/// `count` servers cyclically from the cursor, then advances the
/// cursor by `count` mod pool size, spreading load evenly over many
/// calls. The read and the cursor advance happen under one write
/// guard, so concurrent selections each see a consistent snapshot.
#[derive(Default)]
pub struct RoundRobinRegistry {
    pool: RwLock<Pool>,
}

impl RoundRobinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn server_count(&self) -> usize {
        self.pool.read().await.servers.len()
    }

    pub async fn servers(&self) -> Vec<StorageServer> {
        self.pool.read().await.servers.clone()
    }
}

#[async_trait]
impl ServerRegistry for RoundRobinRegistry {
    async fn register(&self, server: StorageServer) {
        let mut pool = self.pool.write().await;
        info!(id = %server.id, address = %server.address, "registered storage server");
        pool.servers.push(server);
    }

    async fn select_servers(&self, count: usize) -> Result<Vec<StorageServer>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut pool = self.pool.write().await;
        if pool.servers.len() < count {
            return Err(RegistryError::InsufficientServers {
                available: pool.servers.len(),
                requested: count,
            });
        }

        let len = pool.servers.len();
        let start = pool.cursor;
        let selected = (0..count)
            .map(|i| pool.servers[(start + i) % len].clone())
            .collect();
        pool.cursor = (start + count) % len;

        debug!(count, start, "selected storage servers");
        Ok(selected)
    }
}
