use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use service::FileService;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{download, health, upload, AppState};
use crate::{ApiError, ApiResult, Config};

pub struct Server {
    config: Config,
    app_state: Arc<AppState>,
}

impl Server {
    pub fn new(config: Config, file_service: Arc<FileService>) -> Self {
        let app_state = Arc::new(AppState {
            file_service,
            max_upload_size: config.max_upload_size,
        });

        Self { config, app_state }
    }

    pub async fn start(&self) -> ApiResult<()> {
        let app = self.create_router();

        let addr = &self.config.bind_address;
        tracing::info!("starting API server on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ApiError::Internal(format!("server error: {e}")))?;

        Ok(())
    }

    pub fn create_router(&self) -> Router {
        let api_routes = Router::new()
            .route("/upload", post(upload))
            .route("/download/:id", get(download))
            .route("/health", get(health))
            .with_state(self.app_state.clone());

        Router::new().nest("/api/v1", api_routes).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
    }
}
