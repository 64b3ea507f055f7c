//! Testing utilities and mock implementations of the storage traits.
//!
//! The mocks keep everything in memory and let tests inject failures and
//! delays, so submission behavior can be exercised without a database or an
//! object store on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use bugtrail_core::testing::{MockDocumentStore, MockObjectStore};
//! use bugtrail_core::store::Collection;
//!
//! let documents = MockDocumentStore::new();
//! let objects = MockObjectStore::new();
//!
//! // Configure failures
//! documents.fail_writes(Collection::Tickets).await;
//! objects.set_pause_midway(true).await;
//!
//! // Use in TicketSubmitter or AppState...
//! ```

mod mock_document_store;
mod mock_object_store;

pub use mock_document_store::{MockDocumentStore, RecordedWrite, WriteKind};
pub use mock_object_store::{MockObjectStore, RecordedUpload, MOCK_URL_BASE};
