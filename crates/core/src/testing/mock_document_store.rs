//! Mock document store for testing.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::store::{
    merge_fields, union_array_field, Collection, Document, DocumentStore, DocumentStoreError,
};

/// Kind of write recorded by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Set,
    Merge,
    ArrayUnion,
}

/// A recorded write for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub collection: Collection,
    pub id: String,
    pub kind: WriteKind,
    /// Whether the write was applied.
    pub success: bool,
}

/// In-memory implementation of the DocumentStore trait.
///
/// Provides controllable behavior for testing:
/// - Seed and inspect documents
/// - Fail reads or writes per collection
/// - Delay writes per collection to control interleaving
/// - Track every write for assertions
///
/// # Example
///
/// ```rust,ignore
/// use bugtrail_core::testing::MockDocumentStore;
/// use bugtrail_core::store::Collection;
///
/// let store = MockDocumentStore::new();
/// store.fail_writes(Collection::Tickets).await;
///
/// // ... run a submission ...
///
/// assert!(store.document(Collection::Tickets, &id).await.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockDocumentStore {
    documents: Arc<RwLock<HashMap<(Collection, String), Document>>>,
    failing_reads: Arc<RwLock<HashSet<Collection>>>,
    failing_writes: Arc<RwLock<HashSet<Collection>>>,
    write_delays: Arc<RwLock<HashMap<Collection, Duration>>>,
    writes: Arc<RwLock<Vec<RecordedWrite>>>,
}

impl MockDocumentStore {
    /// Create a new empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document directly, bypassing failure injection.
    pub async fn seed(&self, collection: Collection, id: &str, value: Value) {
        let document = match value {
            Value::Object(document) => document,
            other => panic!("seeded document must be a JSON object, got {}", other),
        };
        self.documents
            .write()
            .await
            .insert((collection, id.to_string()), document);
    }

    /// Read a document directly, bypassing failure injection.
    pub async fn document(&self, collection: Collection, id: &str) -> Option<Document> {
        self.documents
            .read()
            .await
            .get(&(collection, id.to_string()))
            .cloned()
    }

    /// Number of documents stored in a collection.
    pub async fn count(&self, collection: Collection) -> usize {
        self.documents
            .read()
            .await
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }

    /// Make every read of `collection` fail.
    pub async fn fail_reads(&self, collection: Collection) {
        self.failing_reads.write().await.insert(collection);
    }

    /// Make every write to `collection` fail.
    pub async fn fail_writes(&self, collection: Collection) {
        self.failing_writes.write().await.insert(collection);
    }

    /// Stop failing writes to `collection`.
    pub async fn clear_write_failure(&self, collection: Collection) {
        self.failing_writes.write().await.remove(&collection);
    }

    /// Delay every write to `collection` before it is applied.
    pub async fn set_write_delay(&self, collection: Collection, delay: Duration) {
        self.write_delays.write().await.insert(collection, delay);
    }

    /// All writes attempted so far, in order of completion.
    pub async fn recorded_writes(&self) -> Vec<RecordedWrite> {
        self.writes.read().await.clone()
    }

    /// Writes attempted against one collection.
    pub async fn writes_to(&self, collection: Collection) -> Vec<RecordedWrite> {
        self.writes
            .read()
            .await
            .iter()
            .filter(|w| w.collection == collection)
            .cloned()
            .collect()
    }

    /// Delay, check failure injection, and record the attempt.
    async fn begin_write(
        &self,
        collection: Collection,
        id: &str,
        kind: WriteKind,
    ) -> Result<(), DocumentStoreError> {
        let delay = self.write_delays.read().await.get(&collection).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let fail = self.failing_writes.read().await.contains(&collection);
        self.writes.write().await.push(RecordedWrite {
            collection,
            id: id.to_string(),
            kind,
            success: !fail,
        });

        if fail {
            return Err(DocumentStoreError::Unavailable(format!(
                "mock write failure on {}/{}",
                collection, id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, DocumentStoreError> {
        if self.failing_reads.read().await.contains(&collection) {
            return Err(DocumentStoreError::Unavailable(format!(
                "mock read failure on {}/{}",
                collection, id
            )));
        }
        Ok(self.document(collection, id).await)
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> Result<(), DocumentStoreError> {
        self.begin_write(collection, id, WriteKind::Set).await?;
        self.documents
            .write()
            .await
            .insert((collection, id.to_string()), document);
        Ok(())
    }

    async fn merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), DocumentStoreError> {
        self.begin_write(collection, id, WriteKind::Merge).await?;
        let mut documents = self.documents.write().await;
        let document = documents.entry((collection, id.to_string())).or_default();
        merge_fields(document, fields);
        Ok(())
    }

    async fn array_union(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        values: Vec<Value>,
    ) -> Result<(), DocumentStoreError> {
        self.begin_write(collection, id, WriteKind::ArrayUnion).await?;
        let mut documents = self.documents.write().await;
        let document = documents.entry((collection, id.to_string())).or_default();
        union_array_field(document, field, values);
        Ok(())
    }
}
