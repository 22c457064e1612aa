//! Data types for fragments, search hits, and store statistics.

use serde::{Deserialize, Serialize};

/// A contiguous run of characters from one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    /// Basename of the originating document.
    pub source: String,
}

impl Fragment {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }
}

/// One search result: a store position and its squared L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub fragments: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
    pub generation: u64,
    pub sources: usize,
    pub store_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}
