//! Indexing job routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::ApiError;
use crate::state::{AppState, IndexingJob, IndexingStatus};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/indexing/jobs", get(get_indexing_jobs))
        .route("/indexing/jobs/{job_id}", get(get_indexing_job))
}

/// GET /indexing/jobs: all tracked jobs, newest first.
async fn get_indexing_jobs(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let jobs = state.indexing_jobs.read();
    let mut all_jobs: Vec<&IndexingJob> = jobs.values().collect();
    all_jobs.sort_by(|a, b| b.queued_at.cmp(&a.queued_at));

    let count = |status: IndexingStatus| all_jobs.iter().filter(|j| j.status == status).count();

    Json(serde_json::json!({
        "jobs": all_jobs,
        "total": all_jobs.len(),
        "queued": count(IndexingStatus::Queued),
        "processing": count(IndexingStatus::Processing),
        "completed": count(IndexingStatus::Completed),
        "failed": count(IndexingStatus::Failed),
    }))
}

/// GET /indexing/jobs/{job_id}
async fn get_indexing_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<IndexingJob>, ApiError> {
    state
        .indexing_jobs
        .read()
        .get(&job_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Job not found".into()))
}
