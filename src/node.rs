use std::sync::Arc;

use registry::{RoundRobinRegistry, ServerRegistry};
use service::{FileService, MemoryMetadataStore};
use storage::MemoryClient;
use tracing::info;

use crate::config::Config;
use crate::error::Result;

/// Wires the gateway together: registry populated from config, the
/// in-memory storage client and metadata store, the file service and
/// the API server.
pub struct Node {
    config: Config,
    api_server: api::Server,
}

impl Node {
    pub async fn new(config: Config) -> Result<Self> {
        info!("initializing gateway node at {}", config.bind_address());

        let registry = Arc::new(RoundRobinRegistry::new());
        for server in &config.servers {
            registry.register(server.clone()).await;
        }

        let client = Arc::new(MemoryClient::new());
        let metadata_store = Arc::new(MemoryMetadataStore::new());
        let file_service = Arc::new(FileService::new(
            registry,
            client,
            metadata_store,
            config.chunk_count,
        ));

        let api_server = api::Server::new((&config).into(), file_service);

        Ok(Self { config, api_server })
    }

    pub async fn start(&self) -> Result<()> {
        info!(
            "gateway node listening on {} ({} storage servers, {} chunks per file)",
            self.config.bind_address(),
            self.config.servers.len(),
            self.config.chunk_count
        );
        self.api_server.start().await?;
        Ok(())
    }
}
