//! Types for the object store module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A blob to be written under `key`.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Object key, a relative `/`-separated path such as `images/<ticket id>`.
    pub key: String,
    /// Raw bytes.
    pub data: Vec<u8>,
    /// Content type recorded with the object.
    pub content_type: String,
}

/// State of an in-flight upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    Queued,
    Running,
    Paused,
    Success,
}

/// Progress update during an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadProgress {
    pub key: String,
    pub bytes_transferred: u64,
    pub total_bytes: u64,
    pub state: UploadState,
}

impl UploadProgress {
    /// Percentage complete (0-100). Empty uploads count as complete.
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            100.0
        } else {
            (self.bytes_transferred as f64 / self.total_bytes as f64) * 100.0
        }
    }
}

/// Metadata recorded for a stored object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub key: String,
    pub content_type: String,
    pub size_bytes: u64,
    /// Hex SHA-256 of the stored bytes.
    pub sha256: String,
    pub uploaded_at: DateTime<Utc>,
}

/// An object read back from the store.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub metadata: ObjectMetadata,
    pub data: Vec<u8>,
}
