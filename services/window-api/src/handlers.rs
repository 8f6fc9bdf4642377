//! HTTP request handlers.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{error, info, warn};
use window_common::{DatasetKind, WindowError};

use crate::metrics::record_query;
use crate::state::AppState;

const SVG_CONTENT_TYPE: &str = "image/svg+xml";
const PNG_CONTENT_TYPE: &str = "image/png";

/// `start_date` / `end_date` query parameters, kept as text so a bad value
/// can be answered in the endpoint's own format.
#[derive(Debug, Default, Deserialize)]
pub struct DateParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateParams {
    /// Both dates as integers, or `None` if either is absent or unparsable.
    pub fn parse(&self) -> Option<(i64, i64)> {
        let start = self.start_date.as_deref()?.trim().parse().ok()?;
        let end = self.end_date.as_deref()?.trim().parse().ok()?;
        Some((start, end))
    }
}

// ============================================================================
// Query
// ============================================================================

/// GET /query - render and publish both dataset kinds for a date window
pub async fn query_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<DateParams>,
) -> Response {
    let Some((start, end)) = params.parse() else {
        warn!(?params, "Query without a usable date range");
        record_query(false);
        return (StatusCode::OK, "failed").into_response();
    };

    match state.pipeline.run(start, end).await {
        Ok(outcome) => {
            record_query(true);
            info!(
                start,
                end,
                days = outcome.window.days(),
                artifacts = outcome.artifacts.len(),
                "Query succeeded"
            );
            (StatusCode::OK, "success").into_response()
        }
        Err(e) => {
            record_query(false);
            error!(start, end, kind = e.kind_name(), error = %e, "Query failed");
            (status_for(&e), "failed").into_response()
        }
    }
}

// ============================================================================
// Artifacts
// ============================================================================

/// GET /image - burn-window image
pub async fn image_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    serve_artifact(&state.pipeline.image_path(DatasetKind::Count), SVG_CONTENT_TYPE).await
}

/// GET /temperature_image - temperature image
pub async fn temperature_image_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    serve_artifact(&state.pipeline.image_path(DatasetKind::Continuous), SVG_CONTENT_TYPE).await
}

/// GET /legend - burn-window legend
pub async fn legend_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    serve_artifact(&state.pipeline.legend_path(DatasetKind::Count), PNG_CONTENT_TYPE).await
}

/// GET /temperature_legend - temperature legend
pub async fn temperature_legend_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    serve_artifact(&state.pipeline.legend_path(DatasetKind::Continuous), PNG_CONTENT_TYPE).await
}

async fn serve_artifact(path: &Path, content_type: &'static str) -> Response {
    match tokio::fs::read(path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read artifact");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read artifact").into_response()
        }
    }
}

// ============================================================================
// County
// ============================================================================

/// GET /county - per-county burn-window summary for a date window
pub async fn county_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<DateParams>,
) -> Response {
    let Some(county) = state.county.clone() else {
        return error_json(StatusCode::NOT_FOUND, "not_configured", "county polygons are not configured");
    };
    let Some((start, end)) = params.parse() else {
        return error_json(
            StatusCode::BAD_REQUEST,
            "invalid_range",
            "start_date and end_date must be integers",
        );
    };

    match tokio::task::spawn_blocking(move || county.query(start, end)).await {
        Ok(Ok(summaries)) => Json(summaries).into_response(),
        Ok(Err(e)) => {
            warn!(start, end, kind = e.kind_name(), error = %e, "County query failed");
            error_json(status_for(&e), e.kind_name(), &e.to_string())
        }
        Err(e) => {
            error!(error = %e, "County task failed");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, "internal", "county query did not complete")
        }
    }
}

fn status_for(e: &WindowError) -> StatusCode {
    StatusCode::from_u16(e.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn error_json(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": code, "message": message })),
    )
        .into_response()
}

// ============================================================================
// Health and metrics
// ============================================================================

/// GET /health - Basic health check
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus metrics endpoint
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}
