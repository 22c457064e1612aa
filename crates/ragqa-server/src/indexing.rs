//! Background indexing queue. Jobs run one at a time so every publish
//! starts from the previous one's generation.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::state::{AppState, IndexingStatus};

/// Completed and failed jobs kept for status queries.
const MAX_FINISHED_JOBS: usize = 100;

/// Start the background indexing worker task.
pub fn start_indexing_worker(state: Arc<AppState>) {
    let mut rx = match state.take_indexing_rx() {
        Some(rx) => rx,
        None => {
            error!("Indexing worker already started");
            return;
        }
    };

    tokio::spawn(async move {
        info!("Background indexing worker started");
        while let Some(request) = rx.recv().await {
            let job_state = state.clone();
            let job_id = request.job_id.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                process_indexing_job(
                    &job_state,
                    &request.job_id,
                    &request.file_path,
                    &request.filename,
                )
            })
            .await;

            if let Err(e) = outcome {
                error!("Indexing job {} panicked: {}", job_id, e);
                state.update_job(&job_id, |job| {
                    job.status = IndexingStatus::Failed;
                    job.error = Some(format!("worker task failed: {}", e));
                    job.completed_at = Some(now_millis());
                });
            }
        }
        info!("Background indexing worker stopped");
    });
}

fn process_indexing_job(state: &AppState, job_id: &str, file_path: &str, filename: &str) {
    state.update_job(job_id, |job| {
        job.status = IndexingStatus::Processing;
        job.started_at = Some(now_millis());
    });

    info!("Processing indexing job {}: {}", job_id, filename);

    match state.ingester.ingest(Path::new(file_path)) {
        Ok(report) => {
            state.update_job(job_id, |job| {
                job.status = IndexingStatus::Completed;
                job.fragments = Some(report.fragments);
                job.generation = report.generation;
                job.completed_at = Some(now_millis());
                if report.fragments == 0 {
                    job.error = Some("No text extracted".to_string());
                }
            });
            info!(
                "Indexed {}: {} fragments ({} total)",
                filename, report.fragments, report.total_fragments
            );
        }
        Err(e) => {
            let err_msg = e.to_string();
            state.update_job(job_id, |job| {
                job.status = IndexingStatus::Failed;
                job.error = Some(err_msg.clone());
                job.completed_at = Some(now_millis());
            });
            error!("Failed to index {}: {}", filename, err_msg);
        }
    }

    cleanup_old_jobs(state);
}

fn cleanup_old_jobs(state: &AppState) {
    let mut jobs = state.indexing_jobs.write();
    let mut finished: Vec<(String, i64)> = jobs
        .values()
        .filter(|j| matches!(j.status, IndexingStatus::Completed | IndexingStatus::Failed))
        .filter_map(|j| j.completed_at.map(|t| (j.id.clone(), t)))
        .collect();

    if finished.len() > MAX_FINISHED_JOBS {
        finished.sort_by_key(|(_, t)| *t);
        let remove_count = finished.len() - MAX_FINISHED_JOBS;
        for (id, _) in finished.into_iter().take(remove_count) {
            jobs.remove(&id);
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
