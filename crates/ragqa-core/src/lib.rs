//! ragqa core: error taxonomy and configuration.

pub mod config;
pub mod error;

pub use config::{DataPaths, RagConfig};
pub use error::{Error, Result};
