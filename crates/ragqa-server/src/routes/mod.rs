//! HTTP route handlers.

pub mod indexing;
pub mod query;
pub mod stats;
pub mod upload;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(stats::routes())
        .merge(upload::routes())
        .merge(query::routes())
        .merge(indexing::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
