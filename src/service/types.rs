//! Request and response types for the annotation web service.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::error::AnnoError;

/// Request body for `POST /api/v1/annotate`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotateRequest {
    /// The HGVS variant string to annotate.
    pub variant: String,
}

/// Standard error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// Response for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" while the process serves requests.
    pub status: String,
}

/// Response for `GET /api/v1/cache/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
    pub negative_hits: u64,
    pub evictions: u64,
    pub size: usize,
    pub in_flight: usize,
    pub capacity: usize,
    /// Percentage of lookups that avoided a fresh provider call.
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            coalesced: stats.coalesced,
            negative_hits: stats.negative_hits,
            evictions: stats.evictions,
            size: stats.size,
            in_flight: stats.in_flight,
            capacity: stats.capacity,
        }
    }
}

/// HTTP status code for an annotation error.
///
/// Transient provider failures map to 503 so clients know a retry can
/// succeed; a malformed provider payload is the upstream's fault and maps
/// to 502.
pub fn status_for(error: &AnnoError) -> StatusCode {
    match error {
        AnnoError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        AnnoError::NotFound { .. } => StatusCode::NOT_FOUND,
        AnnoError::Timeout | AnnoError::RateLimited | AnnoError::Unavailable { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        AnnoError::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
        AnnoError::Io { .. } | AnnoError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render an annotation error as an HTTP error reply.
pub fn error_reply(error: &AnnoError) -> (StatusCode, axum::Json<ErrorResponse>) {
    (
        status_for(error),
        axum::Json(ErrorResponse {
            error: error.kind().to_string(),
            message: error.to_string(),
        }),
    )
}
