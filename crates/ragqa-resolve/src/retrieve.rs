//! Retrieval pipeline: question → vector → nearest fragments.

use std::sync::Arc;

use tracing::debug;

use crate::types::RetrievedFragment;
use ragqa_core::{Error, Result};
use ragqa_infer::EmbedderBackend;
use ragqa_store::VectorStore;

/// Finds the stored fragments nearest to a question.
pub struct Retriever {
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbedderBackend>,
}

impl Retriever {
    pub fn new(store: Arc<VectorStore>, embedder: Arc<dyn EmbedderBackend>) -> Self {
        Self { store, embedder }
    }

    /// Up to `top_k` fragments, ascending by distance to the question.
    ///
    /// Fails with [`Error::StoreNotFound`] before the first successful ingestion.
    pub fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<RetrievedFragment>> {
        let snapshot = self.store.load()?;
        if snapshot.is_empty() {
            return Err(Error::StoreNotFound);
        }

        let query = self.embedder.embed(question)?;
        let neighbors = snapshot.search(&query, top_k)?;
        debug!(
            "Retrieved {} of {} fragments (generation {})",
            neighbors.len(),
            snapshot.len(),
            snapshot.generation()
        );

        neighbors
            .into_iter()
            .map(|n| {
                let fragment = snapshot.fragment(n.position).ok_or_else(|| {
                    Error::StoreCorrupt(format!("no fragment at position {}", n.position))
                })?;
                Ok(RetrievedFragment {
                    position: n.position,
                    text: fragment.text.clone(),
                    source: fragment.source.clone(),
                    distance: n.distance,
                })
            })
            .collect()
    }

    /// Fragment texts only, nearest first.
    pub fn retrieve_texts(&self, question: &str, top_k: usize) -> Result<Vec<String>> {
        Ok(self
            .retrieve(question, top_k)?
            .into_iter()
            .map(|f| f.text)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::build_context;
    use ndarray::{array, Array1};
    use ragqa_store::Fragment;
    use tempfile::TempDir;

    /// Maps a text to (count of 'x', count of 'y').
    struct LetterEmbedder;

    impl EmbedderBackend for LetterEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
            Ok(texts
                .iter()
                .map(|t| array![t.matches('x').count() as f32, t.matches('y').count() as f32])
                .collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn store_with(texts: &[&str]) -> (Arc<VectorStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(VectorStore::open(dir.path()).unwrap());
        if !texts.is_empty() {
            let vectors = LetterEmbedder.embed_batch(texts).unwrap();
            let mut snap = store.load().unwrap();
            snap.create_if_absent(2).unwrap();
            snap.append(
                &vectors,
                texts.iter().map(|t| Fragment::new(*t, "doc.txt")).collect(),
            )
            .unwrap();
            store.save(&mut snap).unwrap();
        }
        (store, dir)
    }

    #[test]
    fn test_empty_store_is_not_found() {
        let (store, _dir) = store_with(&[]);
        let retriever = Retriever::new(store, Arc::new(LetterEmbedder));
        assert!(matches!(
            retriever.retrieve("anything", 3),
            Err(Error::StoreNotFound)
        ));
    }

    #[test]
    fn test_returns_all_fragments_nearest_first() {
        let (store, _dir) = store_with(&["xxxx", "y", "xx", "xxy", "yyyy"]);
        let retriever = Retriever::new(store, Arc::new(LetterEmbedder));

        let results = retriever.retrieve("xxx", 10).unwrap();
        assert_eq!(results.len(), 5);
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
        // "xxxx" and "xx" are both at distance 1; insertion order decides.
        assert_eq!(results[0].text, "xxxx");
        assert_eq!(results[1].text, "xx");
        assert_eq!(results[0].source, "doc.txt");
    }

    #[test]
    fn test_top_k_limits_results() {
        let (store, _dir) = store_with(&["xxxx", "y", "xx", "xxy", "yyyy"]);
        let retriever = Retriever::new(store, Arc::new(LetterEmbedder));

        let texts = retriever.retrieve_texts("yyy", 2).unwrap();
        assert_eq!(texts, vec!["yyyy".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_two_vectors_top_three() {
        let (store, _dir) = store_with(&["x", "yy"]);
        let retriever = Retriever::new(store, Arc::new(LetterEmbedder));

        let results = retriever.retrieve("y", 3).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "yy");
        assert_eq!(build_context(&results), "yy\nx");
    }
}
