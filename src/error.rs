use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("API error: {0}")]
    Api(#[from] api::ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
