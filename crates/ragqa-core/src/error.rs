//! Error types for ragqa.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Dimension mismatch: store expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Store corrupt: {0}")]
    StoreCorrupt(String),

    #[error("Store not found: no documents have been ingested yet")]
    StoreNotFound,

    #[error("Store is empty: nothing to search")]
    EmptyStore,

    /// The store was published by another writer after this snapshot was loaded.
    #[error("Store conflict: snapshot is based on generation {base}, current is {current}")]
    StoreConflict { base: u64, current: u64 },

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
