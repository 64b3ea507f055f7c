//! Trait definitions for the object store module.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::ObjectStoreError;
use super::types::{ObjectMetadata, StoredObject, UploadProgress, UploadRequest};

/// A binary blob store with durable download URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the name of this store implementation.
    fn name(&self) -> &str;

    /// Uploads a blob with progress reporting.
    ///
    /// The progress sender will receive updates during the upload.
    /// If the receiver is dropped, the upload continues without progress reporting.
    async fn upload_with_progress(
        &self,
        request: UploadRequest,
        progress_tx: mpsc::Sender<UploadProgress>,
    ) -> Result<ObjectMetadata, ObjectStoreError>;

    /// Uploads a blob without observing progress.
    async fn upload(&self, request: UploadRequest) -> Result<ObjectMetadata, ObjectStoreError> {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        self.upload_with_progress(request, tx).await
    }

    /// Returns a durable URL for a completed upload.
    async fn download_url(&self, key: &str) -> Result<String, ObjectStoreError>;

    /// Reads an object back, if present.
    async fn fetch(&self, key: &str) -> Result<Option<StoredObject>, ObjectStoreError>;
}
