//! Axum router: maps all URL paths to handlers.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    analyze::analyze_vcf,
    system::{health, tables},
};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.max_upload_bytes;
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/api/health",  get(health))
        .route("/api/tables",  get(tables))
        .route("/api/analyze", post(analyze_vcf))

        // Middleware
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
