//! ragqa ingest: text extraction, segmentation, document ingestion.

pub mod extract;
pub mod ingest;
pub mod segment;

pub use extract::{Extractor, FileExtractor, FileType};
pub use ingest::{IngestReport, Ingester};
pub use segment::{segment, Segmenter};
