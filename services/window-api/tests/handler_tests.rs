//! HTTP tests for the window-api router.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::*;
use grid_processor::BoundarySet;
use renderer::EmptyPolicy;
use test_utils::boundary;
use test_utils::grid::XARRAY_VARIABLE;
use tower::ServiceExt;
use window_api::county::CountyService;
use window_api::server::{build_router, CACHE_CONTROL};
use window_api::state::AppState;

fn app(dir: &std::path::Path, with_counties: bool) -> Router {
    let pipeline = pipeline(default_source(), dir);
    let county = with_counties.then(|| {
        let counties =
            BoundarySet::from_geojson_str(&boundary::two_region_geojson(-124.5, 31.5, -119.0, -113.5, 42.5))
                .unwrap();
        Arc::new(CountyService::new(Arc::new(default_source()), counties, XARRAY_VARIABLE))
    });
    let state = AppState::new(config(dir, EmptyPolicy::Error), pipeline, county, None);
    build_router(Arc::new(state))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

// ============================================================================
// Query
// ============================================================================

#[tokio::test]
async fn test_query_then_fetch_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), false);

    let (status, _, body) = get(&app, "/query?start_date=0&end_date=9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"success");

    for uri in ["/image", "/temperature_image"] {
        let (status, headers, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(headers[header::CONTENT_TYPE], "image/svg+xml");
        assert!(String::from_utf8(body).unwrap().contains("<svg preserveAspectRatio=\"none\""));
    }

    for uri in ["/legend", "/temperature_legend"] {
        let (status, headers, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(headers[header::CONTENT_TYPE], "image/png");
        assert_eq!(&body[..8], b"\x89PNG\r\n\x1a\n");
    }
}

#[tokio::test]
async fn test_query_without_dates_fails() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), false);

    for uri in ["/query", "/query?start_date=0", "/query?start_date=zero&end_date=3"] {
        let (status, _, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body, b"failed", "{}", uri);
    }
}

#[tokio::test]
async fn test_query_with_inverted_window_fails() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), false);

    let (status, _, body) = get(&app, "/query?start_date=5&end_date=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"failed");
}

#[tokio::test]
async fn test_artifacts_absent_before_first_query() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), false);

    for uri in ["/image", "/temperature_image", "/legend", "/temperature_legend"] {
        let (status, _, _) = get(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }
}

// ============================================================================
// County
// ============================================================================

#[tokio::test]
async fn test_county_summaries() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), true);

    let (status, headers, body) = get(&app, "/county?start_date=0&end_date=9").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    // Six columns on each side; the split meridian is shared
    for name in ["West", "East"] {
        assert_eq!(json[name]["cells"], 66, "{}", name);
        assert_eq!(json[name]["mean"], 10.0);
        assert_eq!(json[name]["max"], 10.0);
    }
}

#[tokio::test]
async fn test_county_errors() {
    let dir = tempfile::tempdir().unwrap();

    let (status, _, body) = get(&app(dir.path(), false), "/county?start_date=0&end_date=9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "not_configured");

    let app = app(dir.path(), true);
    let (status, _, _) = get(&app, "/county?start_date=a&end_date=9").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = get(&app, "/county?start_date=9&end_date=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "invalid_range");
}

// ============================================================================
// Headers, health and metrics
// ============================================================================

#[tokio::test]
async fn test_every_response_disables_caching() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), false);

    for uri in ["/health", "/image", "/query"] {
        let (_, headers, _) = get(&app, uri).await;
        assert_eq!(headers[header::CACHE_CONTROL], CACHE_CONTROL, "{}", uri);
    }
}

#[tokio::test]
async fn test_cors_is_permissive() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), false);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_health_and_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path(), false);

    let (status, _, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    let (status, _, _) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
