//! Publish record tying the index blob and the metadata file into one
//! generation.
//!
//! The manifest is written last and replaced by rename, so a reader either
//! sees the previous generation or the complete new one.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use ragqa_core::{Error, Result};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const MANIFEST_VERSION: u32 = 1;

pub const INDEX_PREFIX: &str = "index-";
pub const INDEX_SUFFIX: &str = ".bin";
pub const METADATA_PREFIX: &str = "metadata-";
pub const METADATA_SUFFIX: &str = ".json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub generation: u64,
    pub dimension: usize,
    pub count: usize,
    pub index_file: String,
    pub metadata_file: String,
    pub index_sha256: String,
    pub metadata_sha256: String,
    pub published_at: String,
}

impl Manifest {
    /// Read the manifest in `dir`. `Ok(None)` when nothing has been published.
    pub fn read(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        let data = match fs::read(&path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };
        let manifest: Manifest = serde_json::from_slice(&data)
            .map_err(|e| Error::StoreCorrupt(format!("unreadable manifest: {}", e)))?;
        if manifest.format_version != MANIFEST_VERSION {
            return Err(Error::StoreCorrupt(format!(
                "unsupported manifest version {}",
                manifest.format_version
            )));
        }
        Ok(Some(manifest))
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        write_atomic(dir, MANIFEST_FILE, &data)
    }
}

pub fn index_file_name(generation: u64) -> String {
    format!("{}{:08}{}", INDEX_PREFIX, generation, INDEX_SUFFIX)
}

pub fn metadata_file_name(generation: u64) -> String {
    format!("{}{:08}{}", METADATA_PREFIX, generation, METADATA_SUFFIX)
}

/// Whether `name` is an index or metadata artifact of any generation.
pub fn is_artifact(name: &str) -> bool {
    (name.starts_with(INDEX_PREFIX) && name.ends_with(INDEX_SUFFIX))
        || (name.starts_with(METADATA_PREFIX) && name.ends_with(METADATA_SUFFIX))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Write `bytes` to `dir/name` through a synced temporary file and a rename.
pub fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let tmp_path = dir.join(format!(".{}.tmp", name));
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, dir.join(name))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(generation: u64) -> Manifest {
        Manifest {
            format_version: MANIFEST_VERSION,
            generation,
            dimension: 4,
            count: 2,
            index_file: index_file_name(generation),
            metadata_file: metadata_file_name(generation),
            index_sha256: sha256_hex(b"index"),
            metadata_sha256: sha256_hex(b"metadata"),
            published_at: "2026-01-01T00:00:00+00:00".into(),
        }
    }

    #[test]
    fn test_missing_manifest_reads_as_none() {
        let dir = TempDir::new().unwrap();
        assert!(Manifest::read(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_manifest_write_replaces_previous() {
        let dir = TempDir::new().unwrap();
        sample(1).write(dir.path()).unwrap();
        sample(2).write(dir.path()).unwrap();
        let read = Manifest::read(dir.path()).unwrap().unwrap();
        assert_eq!(read, sample(2));
        assert!(!dir.path().join(".manifest.json.tmp").exists());
    }

    #[test]
    fn test_garbage_manifest_is_corrupt() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), b"{not json").unwrap();
        assert!(matches!(
            Manifest::read(dir.path()),
            Err(Error::StoreCorrupt(_))
        ));
    }

    #[test]
    fn test_artifact_names() {
        assert_eq!(index_file_name(7), "index-00000007.bin");
        assert_eq!(metadata_file_name(7), "metadata-00000007.json");
        assert!(is_artifact("index-00000007.bin"));
        assert!(is_artifact("metadata-00000012.json"));
        assert!(!is_artifact(MANIFEST_FILE));
        assert!(!is_artifact("publish.lock"));
    }
}
