//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use ragqa_chat::Generator;
use ragqa_core::{RagConfig, Result};
use ragqa_infer::EmbedderBackend;
use ragqa_ingest::{Extractor, Ingester, Segmenter};
use ragqa_resolve::Retriever;
use ragqa_store::VectorStore;

/// Indexing job status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingJob {
    pub id: String,
    pub filename: String,
    pub file_path: String,
    pub status: IndexingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragments: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub queued_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexingStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

/// A request to ingest an uploaded file.
pub struct IndexingRequest {
    pub job_id: String,
    pub file_path: String,
    pub filename: String,
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: RagConfig,
    pub store: Arc<VectorStore>,
    pub ingester: Ingester,
    pub retriever: Retriever,
    pub generator: Option<Arc<dyn Generator>>,
    pub indexing_jobs: RwLock<HashMap<String, IndexingJob>>,
    pub indexing_tx: mpsc::UnboundedSender<IndexingRequest>,
    indexing_rx: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<IndexingRequest>>>,
}

impl AppState {
    /// Wire the pipelines from explicit capabilities.
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbedderBackend>,
        extractor: Arc<dyn Extractor>,
        generator: Option<Arc<dyn Generator>>,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let store = Arc::new(VectorStore::open(&config.data_paths.vectordb)?);
        let segmenter = Segmenter::new(config.chunk_size, config.chunk_overlap)?;
        let ingester = Ingester::new(store.clone(), extractor, embedder.clone(), segmenter);
        let retriever = Retriever::new(store.clone(), embedder);

        Ok(Self {
            config,
            store,
            ingester,
            retriever,
            generator,
            indexing_jobs: RwLock::new(HashMap::new()),
            indexing_tx: tx,
            indexing_rx: parking_lot::Mutex::new(Some(rx)),
        })
    }

    /// Take the indexing receiver (can only be called once, by the worker).
    pub fn take_indexing_rx(&self) -> Option<mpsc::UnboundedReceiver<IndexingRequest>> {
        self.indexing_rx.lock().take()
    }

    /// Record a queued job and hand it to the worker.
    pub fn enqueue(&self, filename: String, file_path: String) -> Result<String> {
        let job_id = uuid::Uuid::new_v4().to_string();
        let job = IndexingJob {
            id: job_id.clone(),
            filename: filename.clone(),
            file_path: file_path.clone(),
            status: IndexingStatus::Queued,
            fragments: None,
            generation: None,
            error: None,
            queued_at: chrono::Utc::now().timestamp_millis(),
            started_at: None,
            completed_at: None,
        };
        self.indexing_jobs.write().insert(job_id.clone(), job);

        self.indexing_tx
            .send(IndexingRequest {
                job_id: job_id.clone(),
                file_path,
                filename,
            })
            .map_err(|_| ragqa_core::Error::Internal("indexing worker is not running".into()))?;
        Ok(job_id)
    }

    /// Apply `f` to a job if it is still tracked.
    pub fn update_job(&self, job_id: &str, f: impl FnOnce(&mut IndexingJob)) {
        if let Some(job) = self.indexing_jobs.write().get_mut(job_id) {
            f(job);
        }
    }
}
