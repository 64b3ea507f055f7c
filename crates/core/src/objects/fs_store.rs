//! File system object store implementation.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use super::error::ObjectStoreError;
use super::traits::ObjectStore;
use super::types::{ObjectMetadata, StoredObject, UploadProgress, UploadRequest, UploadState};
use crate::config::StorageConfig;

/// Object store that keeps blobs under a local directory.
///
/// Layout: `<root>/data/<key>` holds the bytes and `<root>/meta/<key>.json`
/// the metadata. Bytes are written to a `.part` file and renamed into place,
/// so a reader never sees a half-written object.
pub struct FsObjectStore {
    root: PathBuf,
    public_url: String,
    chunk_size: usize,
}

impl FsObjectStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.root.clone(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
            chunk_size: config.chunk_size.max(1),
        }
    }

    /// Rejects keys that would resolve outside the store root.
    fn validate_key(key: &str) -> Result<(), ObjectStoreError> {
        let invalid = || ObjectStoreError::InvalidKey {
            key: key.to_string(),
        };

        if key.is_empty() || key.ends_with('/') || key.ends_with(".part") {
            return Err(invalid());
        }

        for component in Path::new(key).components() {
            if !matches!(component, Component::Normal(_)) {
                return Err(invalid());
            }
        }

        Ok(())
    }

    fn data_path(&self, key: &str) -> PathBuf {
        self.root.join("data").join(key)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join("meta").join(format!("{}.json", key))
    }

    async fn ensure_parent(path: &Path, key: &str) -> Result<(), ObjectStoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ObjectStoreError::io(key, e))?;
        }
        Ok(())
    }

    async fn read_metadata(&self, key: &str) -> Result<Option<ObjectMetadata>, ObjectStoreError> {
        let raw = match fs::read(self.meta_path(key)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ObjectStoreError::io(key, e)),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| ObjectStoreError::Metadata {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    /// Write `data` to `part_path` in chunks, then move it to `data_path`.
    /// Returns the hex sha256 of the bytes.
    async fn write_part(
        &self,
        part_path: &Path,
        data_path: &Path,
        key: &str,
        data: &[u8],
        progress_tx: &mpsc::Sender<UploadProgress>,
    ) -> Result<String, ObjectStoreError> {
        let total = data.len() as u64;
        let mut file = File::create(part_path)
            .await
            .map_err(|e| ObjectStoreError::io(key, e))?;
        let mut hasher = Sha256::new();
        let mut written: u64 = 0;

        for chunk in data.chunks(self.chunk_size) {
            file.write_all(chunk)
                .await
                .map_err(|e| ObjectStoreError::io(key, e))?;
            hasher.update(chunk);
            written += chunk.len() as u64;
            report(progress_tx, key, written, total, UploadState::Running).await;
        }

        file.sync_all()
            .await
            .map_err(|e| ObjectStoreError::io(key, e))?;
        drop(file);

        fs::rename(part_path, data_path)
            .await
            .map_err(|e| ObjectStoreError::io(key, e))?;

        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Best-effort progress notification; a dropped receiver is not an error.
async fn report(tx: &mpsc::Sender<UploadProgress>, key: &str, done: u64, total: u64, state: UploadState) {
    let _ = tx
        .send(UploadProgress {
            key: key.to_string(),
            bytes_transferred: done,
            total_bytes: total,
            state,
        })
        .await;
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    fn name(&self) -> &str {
        "filesystem"
    }

    async fn upload_with_progress(
        &self,
        request: UploadRequest,
        progress_tx: mpsc::Sender<UploadProgress>,
    ) -> Result<ObjectMetadata, ObjectStoreError> {
        let key = request.key.as_str();
        Self::validate_key(key)?;

        let total = request.data.len() as u64;
        report(&progress_tx, key, 0, total, UploadState::Queued).await;

        let data_path = self.data_path(key);
        let meta_path = self.meta_path(key);
        Self::ensure_parent(&data_path, key).await?;
        Self::ensure_parent(&meta_path, key).await?;

        let part_path = data_path.with_file_name(format!(
            "{}.part",
            data_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));

        let sha256 = match self
            .write_part(&part_path, &data_path, key, &request.data, &progress_tx)
            .await
        {
            Ok(sha256) => sha256,
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&part_path).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(
                            path = %part_path.display(),
                            error = %cleanup,
                            "Failed to remove partial object"
                        );
                    }
                }
                return Err(e);
            }
        };

        let metadata = ObjectMetadata {
            key: key.to_string(),
            content_type: request.content_type,
            size_bytes: total,
            sha256,
            uploaded_at: Utc::now(),
        };

        let meta_json = serde_json::to_vec(&metadata).map_err(|e| ObjectStoreError::Metadata {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        fs::write(&meta_path, meta_json)
            .await
            .map_err(|e| ObjectStoreError::io(key, e))?;

        report(&progress_tx, key, total, total, UploadState::Success).await;

        tracing::debug!(key = %key, size_bytes = total, "Object stored");
        Ok(metadata)
    }

    async fn download_url(&self, key: &str) -> Result<String, ObjectStoreError> {
        Self::validate_key(key)?;

        if self.read_metadata(key).await?.is_none() {
            return Err(ObjectStoreError::NotFound {
                key: key.to_string(),
            });
        }

        Ok(format!("{}/{}", self.public_url, key))
    }

    async fn fetch(&self, key: &str) -> Result<Option<StoredObject>, ObjectStoreError> {
        Self::validate_key(key)?;

        let metadata = match self.read_metadata(key).await? {
            Some(metadata) => metadata,
            None => return Ok(None),
        };

        let data = fs::read(self.data_path(key))
            .await
            .map_err(|e| ObjectStoreError::io(key, e))?;

        Ok(Some(StoredObject { metadata, data }))
    }
}
