//! ragqa store: flat L2 vector index + fragment metadata, published atomically.

pub mod index;
pub mod manifest;
pub mod store;
pub mod types;

pub use index::FlatL2Index;
pub use manifest::Manifest;
pub use store::{Snapshot, VectorStore};
pub use types::*;
