//! Document store trait and shared merge semantics.

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// A schema-flexible document: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// Named collections the service reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Projects,
    Tickets,
    Users,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Tickets => "tickets",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by document store backends.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Document store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value document interface over named collections.
///
/// Writes are last-writer-wins per document. Nothing spans two documents
/// atomically.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of this backend.
    fn name(&self) -> &str;

    /// Fetch a document by id.
    async fn get(&self, collection: Collection, id: &str)
        -> Result<Option<Document>, DocumentStoreError>;

    /// Create or fully replace a document.
    async fn set(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> Result<(), DocumentStoreError>;

    /// Merge `fields` into a document, creating it if missing.
    ///
    /// Nested objects are merged recursively; every other value, arrays
    /// included, replaces what was stored.
    async fn merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), DocumentStoreError>;

    /// Atomically add `values` to the array `field`, skipping values already present.
    async fn array_union(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        values: Vec<Value>,
    ) -> Result<(), DocumentStoreError>;
}

/// Apply merge-write semantics to a stored document.
pub fn merge_fields(target: &mut Document, fields: Document) {
    for (key, value) in fields {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_fields(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

/// Apply set-union semantics to one array field of a stored document.
///
/// A missing or non-array field is replaced by a fresh array.
pub fn union_array_field(target: &mut Document, field: &str, values: Vec<Value>) {
    let entry = target
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !entry.is_array() {
        *entry = Value::Array(Vec::new());
    }

    if let Value::Array(array) = entry {
        for value in values {
            if !array.contains(&value) {
                array.push(value);
            }
        }
    }
}
