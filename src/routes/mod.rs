//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::path::Path;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// API routes only, with state applied.
fn api(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/tests/generate", post(http::http_post_generate))
        .route("/api/v1/tests/validate", post(http::http_post_validate))
        .route("/api/v1/saved", get(http::http_list_saved).post(http::http_post_saved))
        .route(
            "/api/v1/saved/:id",
            get(http::http_get_saved).delete(http::http_delete_saved),
        )
        .route("/api/v1/export/docx", post(http::http_export_docx))
        .route("/api/v1/export/pdf", post(http::http_export_pdf))
        .route("/api/v1/export/json", post(http::http_export_json))
        .route("/api/v1/export/html", post(http::http_export_html))
        .with_state(state)
}

/// Build the application router with:
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `static_dir` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    let static_service = ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    api(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
