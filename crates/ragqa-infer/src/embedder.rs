//! Embedding capability trait and implementations.
//!
//! The `EmbedderBackend` trait abstracts over embedding generation.
//! Implementations:
//! - `OnnxEmbedder`: ONNX Runtime with all-MiniLM-L6-v2 (requires the `onnx` feature)
//! - `UnavailableEmbedder`: fails every call, used when no model could be loaded

use ndarray::Array1;

use ragqa_core::{Error, Result};

/// Text → fixed-length vector.
///
/// Implementations are order preserving: `embed_batch(texts)[i]` is the
/// vector for `texts[i]`, and every vector has length `dimension()`.
pub trait EmbedderBackend: Send + Sync {
    /// Generate embeddings for a batch of texts.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>>;

    /// Generate an embedding for a single text.
    fn embed(&self, text: &str) -> Result<Array1<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Inference("embedder returned no vector".into()))
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Check if the embedder is available (model loaded).
    fn is_available(&self) -> bool;
}

/// Stand-in used when no embedding model is present. Every call fails.
pub struct UnavailableEmbedder {
    dim: usize,
    reason: String,
}

impl UnavailableEmbedder {
    pub fn new(dim: usize, reason: impl Into<String>) -> Self {
        Self {
            dim,
            reason: reason.into(),
        }
    }
}

impl EmbedderBackend for UnavailableEmbedder {
    fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Array1<f32>>> {
        Err(Error::Inference(format!(
            "no embedding model loaded: {}",
            self.reason
        )))
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    struct Doubling;

    impl EmbedderBackend for Doubling {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
            Ok(texts
                .iter()
                .map(|t| array![t.len() as f32, 2.0 * t.len() as f32])
                .collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_embed_defaults_to_batch_of_one() {
        assert_eq!(Doubling.embed("abc").unwrap(), array![3.0, 6.0]);
    }

    #[test]
    fn test_unavailable_embedder_fails() {
        let embedder = UnavailableEmbedder::new(384, "model.onnx missing");
        assert!(!embedder.is_available());
        assert_eq!(embedder.dimension(), 384);
        let err = embedder.embed("question").unwrap_err();
        assert!(matches!(err, Error::Inference(ref m) if m.contains("model.onnx missing")));
    }
}
