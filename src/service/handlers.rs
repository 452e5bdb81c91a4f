//! Request handlers for the annotation web service.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use crate::record::AnnotationRecord;

use super::server::AppState;
use super::types::{
    error_reply, AnnotateRequest, CacheStatsResponse, ErrorResponse, HealthResponse,
};

type HandlerResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// `GET /api/v1/annotate/{variant}`
///
/// The variant arrives percent-encoded in the path; axum decodes it before
/// this handler runs.
pub async fn annotate_by_path(
    State(state): State<AppState>,
    Path(variant): Path<String>,
) -> HandlerResult<AnnotationRecord> {
    annotate(&state, &variant).await
}

/// `POST /api/v1/annotate` with a JSON body.
pub async fn annotate_by_body(
    State(state): State<AppState>,
    Json(request): Json<AnnotateRequest>,
) -> HandlerResult<AnnotationRecord> {
    annotate(&state, &request.variant).await
}

async fn annotate(state: &AppState, variant: &str) -> HandlerResult<AnnotationRecord> {
    match state.service.lookup(variant).await {
        Ok(record) => Ok(Json((*record).clone())),
        Err(error) => {
            tracing::debug!(%variant, kind = error.kind(), "annotation request failed: {error}");
            Err(error_reply(&error))
        }
    }
}

/// `GET /health`
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// `GET /api/v1/cache/stats`
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse::from(state.service.cache_stats()))
}
