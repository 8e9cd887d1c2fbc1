//! HTTP API for the syllabus service.
//!
//! This module provides the REST API endpoints for:
//! - Health monitoring
//! - Syllabus PDF upload with streamed extraction output
//! - Dashboard aggregates
//! - Browsing and detail views
//! - Curation (cascading deletes)

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    routing::{delete, get, post},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::service::SyllabusService;

pub mod browse;
pub mod catalog;
pub mod dashboard;
pub mod manage;
pub mod upload;

use browse::browse_handler;
use catalog::{
    get_author_handler, get_text_handler, list_authors_handler, list_universities_handler,
};
use dashboard::dashboard_handler;
use manage::{
    delete_author_handler, delete_semester_handler, delete_texts_handler,
    delete_university_handler,
};
use upload::upload_syllabus_handler;

/// Uploads are whole PDF syllabi; 50 MiB covers even scanned ones
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Application state
pub struct AppState {
    pub service: Arc<SyllabusService>,
    pub start_time: Instant,
}

/// Build the API router
pub fn router(service: Arc<SyllabusService>) -> Router {
    let state = Arc::new(AppState {
        service,
        start_time: Instant::now(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/upload",
            post(upload_syllabus_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/dashboard", get(dashboard_handler))
        .route("/browse", get(browse_handler))
        .route("/universities", get(list_universities_handler))
        .route("/universities/{id}", delete(delete_university_handler))
        .route(
            "/universities/{id}/semesters/{semester}",
            delete(delete_semester_handler),
        )
        .route("/authors", get(list_authors_handler))
        .route("/authors/{id}", get(get_author_handler))
        .route("/authors/{id}", delete(delete_author_handler))
        .route("/texts", delete(delete_texts_handler))
        .route("/texts/{id}", get(get_text_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Health ===

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
}
