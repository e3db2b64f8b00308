use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Content-Length header is required")]
    MissingContentLength,

    #[error("file too large: maximum size is {0} bytes")]
    PayloadTooLarge(u64),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<service::ServiceError> for ApiError {
    fn from(err: service::ServiceError) -> Self {
        match err {
            service::ServiceError::FileNotFound(id) => ApiError::NotFound(id),
            service::ServiceError::Storage(storage::StorageError::ChunkNotFound(key)) => {
                ApiError::NotFound(key)
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingContentLength => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
