//! Mock object store for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

use crate::objects::{
    ObjectMetadata, ObjectStore, ObjectStoreError, StoredObject, UploadProgress, UploadRequest,
    UploadState,
};

/// Base of the URLs handed out by the mock.
pub const MOCK_URL_BASE: &str = "mock://objects";

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub key: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub success: bool,
}

/// In-memory implementation of the ObjectStore trait.
///
/// Provides controllable behavior for testing:
/// - Track uploads for assertions
/// - Simulate upload or URL retrieval failures
/// - Simulate a pause mid-upload
/// - Simulate upload duration
#[derive(Debug, Clone)]
pub struct MockObjectStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    /// If set, the next upload will fail with this error.
    next_upload_error: Arc<RwLock<Option<ObjectStoreError>>>,
    /// If true, download URL retrieval fails.
    fail_download_url: Arc<RwLock<bool>>,
    /// Whether the upload reports a paused state halfway through.
    pause_midway: Arc<RwLock<bool>>,
    upload_duration_ms: Arc<RwLock<u64>>,
}

impl Default for MockObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockObjectStore {
    /// Create a new mock object store.
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
            uploads: Arc::new(RwLock::new(Vec::new())),
            next_upload_error: Arc::new(RwLock::new(None)),
            fail_download_url: Arc::new(RwLock::new(false)),
            pause_midway: Arc::new(RwLock::new(false)),
            upload_duration_ms: Arc::new(RwLock::new(0)),
        }
    }

    /// Get all recorded uploads.
    pub async fn recorded_uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    /// Get the number of uploads attempted.
    pub async fn upload_count(&self) -> usize {
        self.uploads.read().await.len()
    }

    /// Bytes stored under `key`, if any.
    pub async fn object_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).map(|o| o.data.clone())
    }

    /// Number of stored objects.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Configure the next upload to fail with the given error.
    pub async fn set_next_upload_error(&self, error: ObjectStoreError) {
        *self.next_upload_error.write().await = Some(error);
    }

    /// Make download URL retrieval fail.
    pub async fn set_fail_download_url(&self, fail: bool) {
        *self.fail_download_url.write().await = fail;
    }

    /// Report a paused state halfway through each upload.
    pub async fn set_pause_midway(&self, pause: bool) {
        *self.pause_midway.write().await = pause;
    }

    /// Set the simulated upload duration.
    pub async fn set_upload_duration(&self, duration: Duration) {
        *self.upload_duration_ms.write().await = duration.as_millis() as u64;
    }

    async fn take_error(&self) -> Option<ObjectStoreError> {
        self.next_upload_error.write().await.take()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload_with_progress(
        &self,
        request: UploadRequest,
        progress_tx: mpsc::Sender<UploadProgress>,
    ) -> Result<ObjectMetadata, ObjectStoreError> {
        let total = request.data.len() as u64;
        let progress = |done: u64, state: UploadState| UploadProgress {
            key: request.key.clone(),
            bytes_transferred: done,
            total_bytes: total,
            state,
        };

        let _ = progress_tx.send(progress(0, UploadState::Queued)).await;

        if let Some(err) = self.take_error().await {
            self.uploads.write().await.push(RecordedUpload {
                key: request.key.clone(),
                content_type: request.content_type.clone(),
                size_bytes: total,
                success: false,
            });
            return Err(err);
        }

        let duration_ms = *self.upload_duration_ms.read().await;
        let _ = progress_tx.send(progress(total / 2, UploadState::Running)).await;
        if *self.pause_midway.read().await {
            let _ = progress_tx.send(progress(total / 2, UploadState::Paused)).await;
            let _ = progress_tx.send(progress(total / 2, UploadState::Running)).await;
        }
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }
        let _ = progress_tx.send(progress(total, UploadState::Running)).await;

        let metadata = ObjectMetadata {
            key: request.key.clone(),
            content_type: request.content_type.clone(),
            size_bytes: total,
            sha256: "mock-sha256".to_string(),
            uploaded_at: Utc::now(),
        };

        self.uploads.write().await.push(RecordedUpload {
            key: request.key.clone(),
            content_type: request.content_type.clone(),
            size_bytes: total,
            success: true,
        });
        self.objects.write().await.insert(
            request.key.clone(),
            StoredObject {
                metadata: metadata.clone(),
                data: request.data,
            },
        );

        let _ = progress_tx.send(progress(total, UploadState::Success)).await;
        Ok(metadata)
    }

    async fn download_url(&self, key: &str) -> Result<String, ObjectStoreError> {
        if *self.fail_download_url.read().await {
            return Err(ObjectStoreError::Unavailable(
                "mock download URL failure".to_string(),
            ));
        }
        if !self.objects.read().await.contains_key(key) {
            return Err(ObjectStoreError::NotFound {
                key: key.to_string(),
            });
        }
        Ok(format!("{}/{}", MOCK_URL_BASE, key))
    }

    async fn fetch(&self, key: &str) -> Result<Option<StoredObject>, ObjectStoreError> {
        Ok(self.objects.read().await.get(key).cloned())
    }
}
