//! Router construction.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, HeaderValue},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

/// Browsers must refetch images and legends after every query.
pub const CACHE_CONTROL: &str = "no-store max-age=0";

/// Build the HTTP router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/query", get(handlers::query_handler))
        .route("/image", get(handlers::image_handler))
        .route("/temperature_image", get(handlers::temperature_image_handler))
        .route("/legend", get(handlers::legend_handler))
        .route("/temperature_legend", get(handlers::temperature_legend_handler))
        .route("/county", get(handlers::county_handler))
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(Extension(state))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
