//! Retrieval types.

use serde::{Deserialize, Serialize};

/// Default number of fragments returned per question.
pub const DEFAULT_TOP_K: usize = ragqa_core::config::DEFAULT_TOP_K;

/// A retrieval request.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrieveQuery {
    pub question: String,
    #[serde(default = "default_top_k", rename = "topK")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// A stored fragment returned for a question, nearest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedFragment {
    pub position: usize,
    pub text: String,
    pub source: String,
    /// Squared L2 distance between the question and the fragment vectors.
    pub distance: f32,
}

/// Join retrieved fragments into the context block handed to the generator.
pub fn build_context(fragments: &[RetrievedFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
