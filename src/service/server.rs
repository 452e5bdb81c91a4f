//! Web server setup using the axum framework.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};

use crate::annotate::AnnotationService;
use crate::error::AnnoError;
use crate::provider::{AnnotationProvider, VepClient};

use super::config::ServiceConfig;
use super::handlers;
use super::types::ErrorResponse;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cached annotation lookups over the configured provider.
    pub service: AnnotationService,
    /// Service configuration.
    pub config: Arc<ServiceConfig>,
}

/// Create the axum application with the configured VEP provider.
pub fn create_app(config: ServiceConfig) -> Result<(Router, AppState), AnnoError> {
    let provider = Arc::new(VepClient::new(&config.annotator.provider)?);
    Ok(create_app_with_provider(config, provider))
}

/// Create the axum application over an explicit provider. Used by tests to
/// swap in a mock.
pub fn create_app_with_provider(
    config: ServiceConfig,
    provider: Arc<dyn AnnotationProvider>,
) -> (Router, AppState) {
    let service = AnnotationService::new(provider, config.annotator.cache_config());

    let state = AppState {
        service,
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/v1/annotate/:variant", get(handlers::annotate_by_path))
        .route("/api/v1/annotate", post(handlers::annotate_by_body))
        .route("/api/v1/cache/stats", get(handlers::cache_stats))
        .fallback(handle_404)
        .with_state(state.clone());

    (app, state)
}

/// Handle unknown routes.
async fn handle_404() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "not_found".to_string(),
            message: "endpoint not found".to_string(),
        }),
    )
}

/// Bind the listener and serve until shutdown.
pub async fn run(config: ServiceConfig) -> Result<(), AnnoError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let (app, _state) = create_app(config)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("annotation service listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
