//! Document storage for projects, tickets and users.

mod sqlite;
mod traits;

pub use sqlite::SqliteDocumentStore;
pub use traits::{
    merge_fields, union_array_field, Collection, Document, DocumentStore, DocumentStoreError,
};
