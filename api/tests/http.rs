use std::sync::Arc;

use api::{Config, Server};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use bytes::Bytes;
use http_body_util::BodyExt;
use registry::{RoundRobinRegistry, ServerRegistry, StorageServer};
use service::{FileService, MemoryMetadataStore};
use storage::MemoryClient;
use tower::ServiceExt;

async fn test_router(max_upload_size: u64) -> axum::Router {
    let registry = Arc::new(RoundRobinRegistry::new());
    for i in 1..=6 {
        registry
            .register(StorageServer::new(format!("s{i}"), format!("memory://s{i}")))
            .await;
    }
    let file_service = Arc::new(FileService::new(
        registry,
        Arc::new(MemoryClient::new()),
        Arc::new(MemoryMetadataStore::new()),
        6,
    ));
    Server::new(
        Config {
            bind_address: "127.0.0.1:0".to_string(),
            max_upload_size,
        },
        file_service,
    )
    .create_router()
}

fn payload(len: usize) -> Bytes {
    Bytes::from((0..len).map(|i| (i % 251) as u8).collect::<Vec<_>>())
}

async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let router = test_router(1024).await;

    let response = router
        .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn upload_requires_content_length() {
    let router = test_router(1024).await;

    let response = router
        .oneshot(
            Request::post("/api/v1/upload")
                .body(Body::from(payload(16)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("Content-Length"));
}

#[tokio::test]
async fn upload_rejects_oversized_files() {
    let router = test_router(1024).await;

    let response = router
        .oneshot(
            Request::post("/api/v1/upload")
                .header(header::CONTENT_LENGTH, "2048")
                .body(Body::from(payload(16)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn upload_then_download_round_trips() {
    let router = test_router(10 * 1024 * 1024).await;
    let data = payload(5_000);

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/upload")
                .header(header::CONTENT_LENGTH, data.len().to_string())
                .header("x-file-name", "report.bin")
                .body(Body::from(data.clone()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["status"], "uploaded");
    assert_eq!(json["fileName"], "report.bin");
    assert_eq!(json["size"], 5_000);
    let file_id = json["fileId"].as_str().unwrap().to_string();

    let response = router
        .oneshot(
            Request::get(format!("/api/v1/download/{file_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_LENGTH],
        data.len().to_string().as_str()
    );
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .starts_with("attachment"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes, data);
}

#[tokio::test]
async fn upload_defaults_the_file_name() {
    let router = test_router(1024).await;

    let response = router
        .oneshot(
            Request::post("/api/v1/upload")
                .header(header::CONTENT_LENGTH, "16")
                .body(Body::from(payload(16)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["fileName"], "unknown");
}

#[tokio::test]
async fn download_of_unknown_file_is_404() {
    let router = test_router(1024).await;

    let response = router
        .oneshot(
            Request::get("/api/v1/download/ffffffffffffffffffffffffffffffff")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
