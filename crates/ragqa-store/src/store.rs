//! Persistent vector store: flat L2 index + parallel fragment metadata.
//!
//! A published store is three files in one directory: `manifest.json`, an
//! index blob and a metadata JSON array. Position `i` of the index is
//! `metadata[i]`. Writers work on an owned [`Snapshot`] and publish it as the
//! next generation; readers load their own snapshot and never observe a
//! half-written store.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use ndarray::Array1;
use tracing::{debug, info, warn};

use crate::index::FlatL2Index;
use crate::manifest::{
    index_file_name, is_artifact, metadata_file_name, sha256_hex, write_atomic, Manifest,
    INDEX_PREFIX, MANIFEST_VERSION,
};
use crate::types::*;
use ragqa_core::{Error, Result};

const LOCK_FILE: &str = "publish.lock";

/// In-memory copy of one published generation.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    index: Option<FlatL2Index>,
    fragments: Vec<Fragment>,
    /// Generation this snapshot was loaded from (0 = nothing published).
    generation: u64,
}

impl Snapshot {
    /// The empty-store state: no index, dimension undetermined.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_none()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.index.as_ref().map(|i| i.dimension())
    }

    pub fn index(&self) -> Option<&FlatL2Index> {
        self.index.as_ref()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn fragment(&self, position: usize) -> Option<&Fragment> {
        self.fragments.get(position)
    }

    /// Allocate the index on first ingestion. An existing index is returned
    /// as is; its dimension never changes.
    pub fn create_if_absent(&mut self, dimension: usize) -> Result<&mut FlatL2Index> {
        if self.index.is_none() {
            debug!("Creating flat L2 index, dim={}", dimension);
            self.index = Some(FlatL2Index::new(dimension)?);
        }
        self.index
            .as_mut()
            .ok_or_else(|| Error::Internal("index missing after creation".into()))
    }

    /// Append vectors and fragments in lock-step. On error nothing changes.
    pub fn append(&mut self, vectors: &[Array1<f32>], fragments: Vec<Fragment>) -> Result<()> {
        if vectors.len() != fragments.len() {
            return Err(Error::Ingest(format!(
                "{} vectors for {} fragments",
                vectors.len(),
                fragments.len()
            )));
        }
        let index = self
            .index
            .as_mut()
            .ok_or_else(|| Error::Internal("append called before the index was created".into()))?;
        index.add(vectors)?;
        self.fragments.extend(fragments);
        Ok(())
    }

    /// Nearest stored positions to `query`, ascending by squared L2 distance.
    pub fn search(&self, query: &Array1<f32>, top_k: usize) -> Result<Vec<Neighbor>> {
        match &self.index {
            Some(index) => index.search(query, top_k),
            None => Err(Error::EmptyStore),
        }
    }
}

/// Handle on a store directory. Cheap; all state lives on disk.
pub struct VectorStore {
    dir: PathBuf,
}

impl VectorStore {
    /// Open (or create) the store directory, e.g. `data/vectordb/`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Generation currently published, 0 if none.
    pub fn current_generation(&self) -> Result<u64> {
        Ok(Manifest::read(&self.dir)?.map_or(0, |m| m.generation))
    }

    /// Load the published generation.
    ///
    /// Nothing published gives [`Snapshot::empty`]. A manifest whose artifacts
    /// are missing, tampered with, or disagree in length is
    /// [`Error::StoreCorrupt`], never an empty store. Without a manifest, an
    /// index with no metadata (or the reverse) is corrupt as well.
    ///
    /// Holds a shared lock on the publish lock file while reading, so a
    /// concurrent [`VectorStore::save`] is seen entirely or not at all.
    pub fn load(&self) -> Result<Snapshot> {
        let lock = self.lock_shared()?;
        let loaded = self.read_published();
        let _ = FileExt::unlock(&lock);
        loaded.map(|(snapshot, _)| snapshot)
    }

    /// Read the current manifest and its artifacts. Caller holds the lock.
    fn read_published(&self) -> Result<(Snapshot, Option<Manifest>)> {
        let manifest = match Manifest::read(&self.dir)? {
            Some(m) => m,
            None => {
                self.check_unpublished()?;
                return Ok((Snapshot::empty(), None));
            }
        };

        let index_path = self.dir.join(&manifest.index_file);
        let metadata_path = self.dir.join(&manifest.metadata_file);
        match (index_path.exists(), metadata_path.exists()) {
            (true, true) => {}
            (false, false) => {
                return Err(Error::StoreCorrupt(format!(
                    "generation {} has neither {} nor {}",
                    manifest.generation, manifest.index_file, manifest.metadata_file
                )))
            }
            (true, false) => {
                return Err(Error::StoreCorrupt(format!(
                    "index {} exists without metadata {}",
                    manifest.index_file, manifest.metadata_file
                )))
            }
            (false, true) => {
                return Err(Error::StoreCorrupt(format!(
                    "metadata {} exists without index {}",
                    manifest.metadata_file, manifest.index_file
                )))
            }
        }

        let index_bytes = fs::read(&index_path)?;
        let metadata_bytes = fs::read(&metadata_path)?;
        verify_checksum(&manifest.index_file, &index_bytes, &manifest.index_sha256)?;
        verify_checksum(&manifest.metadata_file, &metadata_bytes, &manifest.metadata_sha256)?;

        let index = FlatL2Index::from_bytes(&index_bytes)?;
        let fragments: Vec<Fragment> = serde_json::from_slice(&metadata_bytes)
            .map_err(|e| Error::StoreCorrupt(format!("unreadable metadata: {}", e)))?;

        if index.len() != fragments.len() || index.len() != manifest.count {
            return Err(Error::StoreCorrupt(format!(
                "index has {} vectors, metadata {} fragments, manifest {}",
                index.len(),
                fragments.len(),
                manifest.count
            )));
        }
        if index.dimension() != manifest.dimension {
            return Err(Error::StoreCorrupt(format!(
                "index dimension {} disagrees with manifest dimension {}",
                index.dimension(),
                manifest.dimension
            )));
        }

        debug!(
            "Loaded store generation {}: {} fragments, dim={}",
            manifest.generation,
            fragments.len(),
            index.dimension()
        );

        let snapshot = Snapshot {
            index: Some(index),
            fragments,
            generation: manifest.generation,
        };
        Ok((snapshot, Some(manifest)))
    }

    /// Publish `snapshot` as the next generation.
    ///
    /// Both artifacts are written under new names first; the manifest rename
    /// commits them. Fails with [`Error::StoreConflict`] if another writer
    /// published since `snapshot` was loaded. On success the snapshot's
    /// generation is advanced.
    pub fn save(&self, snapshot: &mut Snapshot) -> Result<Manifest> {
        let index = snapshot.index.as_ref().ok_or(Error::EmptyStore)?;
        if index.len() != snapshot.fragments.len() {
            return Err(Error::Internal(format!(
                "refusing to publish {} vectors with {} fragments",
                index.len(),
                snapshot.fragments.len()
            )));
        }

        let lock = self.lock_publish()?;

        let current = self.current_generation()?;
        if current != snapshot.generation {
            let _ = FileExt::unlock(&lock);
            return Err(Error::StoreConflict {
                base: snapshot.generation,
                current,
            });
        }

        let generation = current + 1;
        let index_bytes = index.to_bytes();
        let metadata_bytes = serde_json::to_vec(&snapshot.fragments)?;

        let manifest = Manifest {
            format_version: MANIFEST_VERSION,
            generation,
            dimension: index.dimension(),
            count: index.len(),
            index_file: index_file_name(generation),
            metadata_file: metadata_file_name(generation),
            index_sha256: sha256_hex(&index_bytes),
            metadata_sha256: sha256_hex(&metadata_bytes),
            published_at: chrono::Utc::now().to_rfc3339(),
        };

        let published = write_atomic(&self.dir, &manifest.index_file, &index_bytes)
            .and_then(|_| write_atomic(&self.dir, &manifest.metadata_file, &metadata_bytes))
            .and_then(|_| manifest.write(&self.dir));
        if let Err(e) = published {
            self.remove_stale_artifacts(current);
            let _ = FileExt::unlock(&lock);
            return Err(e);
        }
        self.sync_dir();
        self.remove_stale_artifacts(generation);
        let _ = FileExt::unlock(&lock);

        snapshot.generation = generation;
        info!(
            "Published store generation {}: {} fragments, dim={}",
            generation, manifest.count, manifest.dimension
        );
        Ok(manifest)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let lock = self.lock_shared()?;
        let loaded = self.read_published();
        let _ = FileExt::unlock(&lock);
        let (snapshot, manifest) = loaded?;
        let published_at = manifest.map(|m| m.published_at);
        let sources: HashSet<&str> = snapshot
            .fragments
            .iter()
            .map(|f| f.source.as_str())
            .collect();
        Ok(StoreStats {
            fragments: snapshot.len(),
            dimension: snapshot.dimension(),
            generation: snapshot.generation,
            sources: sources.len(),
            store_dir: self.dir.display().to_string(),
            published_at,
        })
    }

    /// With no manifest, artifacts of only one kind mean a half-written store.
    /// Both kinds together are an uncommitted publish and are dropped by the
    /// next `save`.
    fn check_unpublished(&self) -> Result<()> {
        let mut has_index = false;
        let mut has_metadata = false;
        for entry in fs::read_dir(&self.dir)?.filter_map(|e| e.ok()) {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !is_artifact(&name) {
                continue;
            }
            if name.starts_with(INDEX_PREFIX) {
                has_index = true;
            } else {
                has_metadata = true;
            }
        }

        match (has_index, has_metadata) {
            (true, false) => Err(Error::StoreCorrupt(
                "index present without metadata and no manifest".into(),
            )),
            (false, true) => Err(Error::StoreCorrupt(
                "metadata present without index and no manifest".into(),
            )),
            (true, true) => {
                warn!("Ignoring unpublished artifacts in {}", self.dir.display());
                Ok(())
            }
            (false, false) => Ok(()),
        }
    }

    /// Exclusive advisory lock over the publish sequence, shared with other
    /// processes using the same directory. Readers are kept out until the
    /// manifest is replaced and stale artifacts are gone.
    fn lock_publish(&self) -> Result<File> {
        let file = self.open_lock_file()?;
        file.lock_exclusive()?;
        Ok(file)
    }

    /// Shared lock taken by readers; any number may hold it at once.
    fn lock_shared(&self) -> Result<File> {
        let file = self.open_lock_file()?;
        FileExt::lock_shared(&file)?;
        Ok(file)
    }

    fn open_lock_file(&self) -> Result<File> {
        Ok(OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.dir.join(LOCK_FILE))?)
    }

    /// Remove artifacts and temp files that do not belong to `keep`.
    fn remove_stale_artifacts(&self, keep: u64) {
        let keep_names = [index_file_name(keep), metadata_file_name(keep)];
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) => {
                warn!("Cannot scan {} for stale artifacts: {}", self.dir.display(), e);
                return;
            }
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name().to_string_lossy().to_string();
            let stale_artifact = is_artifact(&name) && !keep_names.contains(&name);
            let leftover_tmp = name.starts_with('.') && name.ends_with(".tmp");
            if stale_artifact || leftover_tmp {
                if let Err(e) = fs::remove_file(entry.path()) {
                    debug!("Could not remove stale {}: {}", name, e);
                }
            }
        }
    }

    fn sync_dir(&self) {
        // Directory fsync makes the renames durable; unsupported on some platforms.
        if let Ok(dir) = File::open(&self.dir) {
            let _ = dir.sync_all();
        }
    }
}

fn verify_checksum(name: &str, bytes: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_hex(bytes);
    if actual != expected {
        return Err(Error::StoreCorrupt(format!(
            "{} checksum mismatch: expected {}, found {}",
            name, expected, actual
        )));
    }
    Ok(())
}
