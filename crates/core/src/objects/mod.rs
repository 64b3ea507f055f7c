//! Binary object storage for ticket attachments.

mod error;
mod fs_store;
mod traits;
mod types;

pub use error::ObjectStoreError;
pub use fs_store::FsObjectStore;
pub use traits::ObjectStore;
pub use types::{ObjectMetadata, StoredObject, UploadProgress, UploadRequest, UploadState};

/// Object key for the image attached to a ticket.
///
/// Derived from the ticket id alone so the object can be located without the ticket.
pub fn image_key(ticket_id: &str) -> String {
    format!("images/{}", ticket_id)
}
