//! Document ingestion pipeline: file → text → fragments → vectors → store.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::extract::Extractor;
use crate::segment::Segmenter;
use ragqa_core::{Error, Result};
use ragqa_infer::EmbedderBackend;
use ragqa_store::{Fragment, VectorStore};

/// Outcome of one successful ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub source: String,
    /// Fragments added by this document.
    pub fragments: usize,
    /// Fragments in the store after publishing.
    pub total_fragments: usize,
    /// Published generation, `None` if the document produced no fragments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
    pub duration_ms: u64,
}

/// Handles document ingestion. Every step must succeed before anything is
/// published; a failure leaves the store at its previous generation.
pub struct Ingester {
    store: Arc<VectorStore>,
    extractor: Arc<dyn Extractor>,
    embedder: Arc<dyn EmbedderBackend>,
    segmenter: Segmenter,
}

impl Ingester {
    pub fn new(
        store: Arc<VectorStore>,
        extractor: Arc<dyn Extractor>,
        embedder: Arc<dyn EmbedderBackend>,
        segmenter: Segmenter,
    ) -> Self {
        Self {
            store,
            extractor,
            embedder,
            segmenter,
        }
    }

    pub fn segmenter(&self) -> Segmenter {
        self.segmenter
    }

    /// Ingest a document file, tagging its fragments with the file's basename.
    pub fn ingest(&self, path: &Path) -> Result<IngestReport> {
        let started = Instant::now();
        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Ingest(format!("{} has no file name", path.display())))?
            .to_string();
        info!("Ingestion started for {}", path.display());

        let text = self.extractor.extract(path)?;
        self.ingest_text(&text, &source, started)
    }

    fn ingest_text(&self, text: &str, source: &str, started: Instant) -> Result<IngestReport> {
        let segments = self.segmenter.segment(text);
        if segments.is_empty() {
            debug!("No text extracted from {}", source);
            let total_fragments = self.store.load()?.len();
            return Ok(IngestReport {
                source: source.to_string(),
                fragments: 0,
                total_fragments,
                generation: None,
                duration_ms: started.elapsed().as_millis() as u64,
            });
        }

        let texts: Vec<&str> = segments.iter().map(|s| s.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        if vectors.len() != segments.len() {
            return Err(Error::Inference(format!(
                "embedder returned {} vectors for {} fragments",
                vectors.len(),
                segments.len()
            )));
        }

        let fragments: Vec<Fragment> = segments
            .into_iter()
            .map(|text| Fragment::new(text, source))
            .collect();
        let added = fragments.len();

        let mut snapshot = self.store.load()?;
        snapshot.create_if_absent(vectors[0].len())?;
        snapshot.append(&vectors, fragments)?;
        let manifest = self.store.save(&mut snapshot)?;

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "Ingestion completed for {}: fragments={} total={} time={}ms",
            source, added, manifest.count, duration_ms
        );

        Ok(IngestReport {
            source: source.to_string(),
            fragments: added,
            total_fragments: manifest.count,
            generation: Some(manifest.generation),
            duration_ms,
        })
    }
}
