//! ragqa infer: embedding capability.
//!
//! Provides the `EmbedderBackend` trait. When the `onnx` feature is enabled
//! and model files are present, `OnnxEmbedder` loads all-MiniLM-L6-v2 for
//! 384-dim embeddings. Otherwise `UnavailableEmbedder` is used and ingestion
//! and queries report an inference error.

pub mod embedder;
pub mod onnx_embedder;

pub use embedder::{EmbedderBackend, UnavailableEmbedder};

#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;

use std::path::Path;
use std::sync::Arc;

/// Dimension of all-MiniLM-L6-v2, reported by the fallback embedder.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Create the best available embedder for the given model directory.
pub fn create_embedder(model_dir: &Path) -> Arc<dyn EmbedderBackend> {
    #[cfg(feature = "onnx")]
    let reason = match OnnxEmbedder::load(model_dir) {
        Ok(embedder) => {
            tracing::info!("Using ONNX embedder (dim={})", embedder.dimension());
            return Arc::new(embedder);
        }
        Err(e) => {
            tracing::warn!("ONNX embedder unavailable: {}", e);
            e.to_string()
        }
    };

    #[cfg(not(feature = "onnx"))]
    let reason = {
        tracing::warn!(
            "ONNX feature disabled; no embedder for {}",
            model_dir.display()
        );
        String::from("built without the onnx feature")
    };

    Arc::new(UnavailableEmbedder::new(DEFAULT_EMBEDDING_DIM, reason))
}
