//! Question answering and raw retrieval.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;
use ragqa_resolve::{build_context, RetrieveQuery, RetrievedFragment};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/query", post(query))
        .route("/retrieve", post(retrieve))
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct RetrieveResponse {
    pub question: String,
    pub results: Vec<RetrievedFragment>,
    pub total: usize,
    #[serde(rename = "latencyMs")]
    pub latency_ms: u64,
}

/// POST /query: retrieve context and generate an answer.
async fn query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RetrieveQuery>,
) -> Result<Json<QueryResponse>, ApiError> {
    let started = Instant::now();
    let fragments = run_retrieval(&state, &req).await?;

    let generator = state
        .generator
        .clone()
        .ok_or_else(|| ApiError::Unavailable("No LLM provider configured".into()))?;

    let context = build_context(&fragments);
    let answer = generator.generate(&req.question, &context).await?;
    info!(
        "[QUERY] latency={}ms chunks={} generator={}",
        started.elapsed().as_millis(),
        fragments.len(),
        generator.describe()
    );

    Ok(Json(QueryResponse { answer }))
}

/// POST /retrieve: nearest fragments with distances, no generation.
async fn retrieve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RetrieveQuery>,
) -> Result<Json<RetrieveResponse>, ApiError> {
    let started = Instant::now();
    let results = run_retrieval(&state, &req).await?;
    let latency_ms = started.elapsed().as_millis() as u64;
    info!("[RETRIEVE] latency={}ms chunks={}", latency_ms, results.len());
    Ok(Json(RetrieveResponse {
        question: req.question,
        total: results.len(),
        results,
        latency_ms,
    }))
}

async fn run_retrieval(
    state: &Arc<AppState>,
    req: &RetrieveQuery,
) -> Result<Vec<RetrievedFragment>, ApiError> {
    if req.question.trim().is_empty() {
        return Err(ApiError::BadRequest("Question is required".into()));
    }

    let state = state.clone();
    let question = req.question.clone();
    let top_k = req.top_k;
    let fragments =
        tokio::task::spawn_blocking(move || state.retriever.retrieve(&question, top_k)).await??;
    Ok(fragments)
}
