//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Fragment length in characters used when nothing else is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Characters shared by consecutive fragments.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;
/// Fragments handed to the generator per question.
pub const DEFAULT_TOP_K: usize = 3;
/// HTTP port.
pub const DEFAULT_PORT: u16 = 8000;

/// Paths to all ragqa data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Vector store directory (`data/vectordb/`).
    pub vectordb: PathBuf,
    /// Uploaded documents (`data/uploads/`).
    pub uploads: PathBuf,
    /// Embedding model files (`data/models/`).
    pub models: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            vectordb: root.join("vectordb"),
            uploads: root.join("uploads"),
            models: root.join("models"),
            llm_config_file: root.join("llm-config.json"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.vectordb)?;
        std::fs::create_dir_all(&self.uploads)?;
        Ok(())
    }
}

/// Top-level ragqa configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Fragment length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive fragments.
    pub chunk_overlap: usize,
    /// Default number of fragments retrieved per question.
    pub top_k: usize,
}

impl RagConfig {
    /// Create configuration from environment and defaults.
    ///
    /// Chunk parameters are validated here so a bad deployment fails at
    /// startup rather than on the first upload.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let port = env_or("PORT", DEFAULT_PORT)?;
        let chunk_size = env_or("RAGQA_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        let chunk_overlap = env_or("RAGQA_CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?;
        let top_k = env_or("RAGQA_TOP_K", DEFAULT_TOP_K)?;

        let mut data_paths = DataPaths::new(data_dir)?;
        if let Ok(model_dir) = std::env::var("RAGQA_MODEL_DIR") {
            data_paths.models = PathBuf::from(model_dir);
        }

        let config = Self {
            port,
            data_paths,
            chunk_size,
            chunk_overlap,
            top_k,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration with defaults rooted at `data_dir`, ignoring the environment.
    pub fn with_defaults(data_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            port: DEFAULT_PORT,
            data_paths: DataPaths::new(data_dir)?,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Configuration("chunk size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Configuration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(Error::Configuration("top_k must be positive".into()));
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Configuration(format!("{} is not a valid value: {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_data_paths_created() {
        let dir = TempDir::new().unwrap();
        let paths = DataPaths::new(dir.path()).unwrap();
        assert!(paths.vectordb.is_dir());
        assert!(paths.uploads.is_dir());
        assert_eq!(paths.llm_config_file, dir.path().join("llm-config.json"));
    }

    #[test]
    fn test_defaults_are_valid() {
        let dir = TempDir::new().unwrap();
        let config = RagConfig::with_defaults(dir.path()).unwrap();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.top_k, 3);
        config.validate().unwrap();
    }

    #[test]
    fn test_overlap_not_smaller_than_size_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = RagConfig::with_defaults(dir.path()).unwrap();
        config.chunk_overlap = config.chunk_size;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        config.chunk_size = 0;
        config.chunk_overlap = 0;
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }
}
