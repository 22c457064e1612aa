//! Health and stats routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::ApiError;
use crate::state::{AppState, IndexingStatus};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(get_stats))
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /stats: store statistics and queue depth.
async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let store = state.store.clone();
    let store_stats = tokio::task::spawn_blocking(move || store.stats()).await??;

    let jobs = state.indexing_jobs.read();
    let queued = jobs
        .values()
        .filter(|j| j.status == IndexingStatus::Queued)
        .count();
    let processing = jobs
        .values()
        .filter(|j| j.status == IndexingStatus::Processing)
        .count();

    Ok(Json(serde_json::json!({
        "fragments": store_stats.fragments,
        "dimension": store_stats.dimension,
        "generation": store_stats.generation,
        "sources": store_stats.sources,
        "publishedAt": store_stats.published_at,
        "uploads": count_files_in_dir(&state.config.data_paths.uploads),
        "chunkSize": state.config.chunk_size,
        "chunkOverlap": state.config.chunk_overlap,
        "generator": state.generator.as_ref().map(|g| g.describe()),
        "indexingQueue": {
            "queued": queued,
            "processing": processing,
        },
    })))
}

fn count_files_in_dir(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                .count()
        })
        .unwrap_or(0)
}
