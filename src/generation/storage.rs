//! Filesystem storage for generated media artifacts.
//!
//! Artifacts are stored under `{base_dir}/{resource_id}/{hash}.{format}`
//! with content-hash naming, so re-storing identical bytes is idempotent and
//! a half-written file from a crashed run can never be confused with a
//! finished one of the same name.

use std::path::PathBuf;

use sha2::{Digest, Sha256};
use stellar_common::{GenerationError, ResourceId};

use super::provider::GeneratedMedia;

/// Metadata about a stored artifact.
#[derive(Debug, Clone)]
pub struct StoredMedia {
    /// Content hash (first 16 hex chars of SHA-256).
    pub hash: String,
    /// Absolute path of the stored file.
    pub path: PathBuf,
}

/// Filesystem manager for generated artifacts.
pub struct MediaStorage {
    base_dir: PathBuf,
}

impl MediaStorage {
    /// Create a new `MediaStorage` with the given base directory.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Write an artifact to disk.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Storage`] when the directory cannot be
    /// created or the file cannot be written.
    pub fn store(
        &self,
        resource_id: ResourceId,
        media: &GeneratedMedia,
    ) -> Result<StoredMedia, GenerationError> {
        let hash = compute_hash(&media.bytes);

        let dir = self.base_dir.join(resource_id.to_string());
        std::fs::create_dir_all(&dir).map_err(|e| {
            GenerationError::storage()
                .with_message(format!("Failed to create media directory: {}", dir.display()))
                .with_source(e)
        })?;

        let path = dir.join(format!("{}.{}", hash, media.format));
        std::fs::write(&path, &media.bytes).map_err(|e| {
            GenerationError::storage()
                .with_message(format!("Failed to write media file: {}", path.display()))
                .with_source(e)
        })?;

        Ok(StoredMedia { hash, path })
    }
}

fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    hex::encode(&digest[..8]) // 8 bytes = 16 hex chars
}
