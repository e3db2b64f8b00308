mod error;
mod handlers;
mod server;

pub use error::{ApiError, ApiResult};
pub use server::Server;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub max_upload_size: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "fileId")]
    pub file_id: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub size: u64,
    pub status: String,
}
