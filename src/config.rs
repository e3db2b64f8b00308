use registry::StorageServer;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

pub const DEFAULT_CHUNK_COUNT: usize = 6;
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024 * 1024; // 10 GiB

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub node_ip: IpAddr,
    pub port: u16,
    pub chunk_count: usize,
    pub max_upload_size: u64,
    pub servers: Vec<StorageServer>,
}

impl Config {
    pub fn new(node_ip: IpAddr, port: u16) -> Self {
        Self {
            node_ip,
            port,
            chunk_count: DEFAULT_CHUNK_COUNT,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            servers: (1..=DEFAULT_CHUNK_COUNT)
                .map(|i| StorageServer::new(format!("s{i}"), format!("memory://s{i}")))
                .collect(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.node_ip, self.port)
    }

    /// Parses a comma-separated `id=address` server list.
    pub fn parse_servers(raw: &str) -> Result<Vec<StorageServer>, String> {
        raw.split(',')
            .map(|entry| {
                let entry = entry.trim();
                let (id, address) = entry
                    .split_once('=')
                    .ok_or_else(|| format!("expected id=address, got '{entry}'"))?;
                Ok(StorageServer::new(id, address))
            })
            .collect()
    }
}

impl From<&Config> for api::Config {
    fn from(config: &Config) -> Self {
        api::Config {
            bind_address: config.bind_address(),
            max_upload_size: config.max_upload_size,
        }
    }
}
