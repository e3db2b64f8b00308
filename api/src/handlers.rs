use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chunk::{ByteStream, StreamError};
use futures::TryStreamExt;
use serde_json::json;
use service::FileService;
use tracing::debug;

use crate::{ApiError, ApiResult, UploadResponse};

pub struct AppState {
    pub file_service: Arc<FileService>,
    pub max_upload_size: u64,
}

/// POST /api/v1/upload: raw file bytes in the body, size taken from
/// Content-Length, optional X-File-Name header. The body is streamed
/// into the service, never buffered whole.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> ApiResult<Json<UploadResponse>> {
    let size = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or(ApiError::MissingContentLength)?;

    if size > state.max_upload_size {
        return Err(ApiError::PayloadTooLarge(state.max_upload_size));
    }

    let file_name = headers
        .get("x-file-name")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let source = ByteStream::new(
        body.into_data_stream()
            .map_err(|err| StreamError::Read(err.to_string())),
    );

    let file_id = state.file_service.upload(source, size).await?;
    debug!(file = %file_id, name = %file_name, size, "file uploaded");

    Ok(Json(UploadResponse {
        file_id,
        file_name,
        size,
        status: "uploaded".to_string(),
    }))
}

/// GET /api/v1/download/:id: streams the reassembled file back as an
/// attachment with an exact Content-Length.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> ApiResult<Response> {
    let (stream, size) = state.file_service.download(&file_id).await?;

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_id}\""),
            ),
            (header::CONTENT_LENGTH, size.to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// GET /api/v1/health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
