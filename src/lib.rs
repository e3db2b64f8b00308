pub mod config;
pub mod error;
pub mod node;

pub use config::Config;
pub use error::{GatewayError, Result};
pub use node::Node;

// Re-export key types from workspace crates
pub use api;
pub use chunk;
pub use registry;
pub use service;
pub use storage;
