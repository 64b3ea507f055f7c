//! SQLite-backed document store implementation.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{merge_fields, union_array_field, Collection, Document, DocumentStore, DocumentStoreError};

/// SQLite-backed document store.
///
/// Every collection lives in one `documents` table keyed by
/// `(collection, id)`, with the document body stored as JSON text.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Create a new SQLite document store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, DocumentStoreError> {
        let conn =
            Connection::open(path).map_err(|e| DocumentStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite document store (useful for testing).
    pub fn in_memory() -> Result<Self, DocumentStoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DocumentStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), DocumentStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_updated_at ON documents(updated_at);
            "#,
        )
        .map_err(|e| DocumentStoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DocumentStoreError> {
        self.conn
            .lock()
            .map_err(|_| DocumentStoreError::Database("connection mutex poisoned".to_string()))
    }

    fn read(
        conn: &Connection,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, DocumentStoreError> {
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ? AND id = ?",
                params![collection.as_str(), id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DocumentStoreError::Database(e.to_string()))?;

        match data {
            Some(json) => match serde_json::from_str::<Value>(&json) {
                Ok(Value::Object(document)) => Ok(Some(document)),
                Ok(_) => Err(DocumentStoreError::Serialization(format!(
                    "{}/{} is not a JSON object",
                    collection, id
                ))),
                Err(e) => Err(DocumentStoreError::Serialization(e.to_string())),
            },
            None => Ok(None),
        }
    }

    fn write(
        conn: &Connection,
        collection: Collection,
        id: &str,
        document: &Document,
    ) -> Result<(), DocumentStoreError> {
        let data = serde_json::to_string(document)
            .map_err(|e| DocumentStoreError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO documents (collection, id, data, updated_at) VALUES (?, ?, ?, ?)",
            params![collection.as_str(), id, data, Utc::now().to_rfc3339()],
        )
        .map_err(|e| DocumentStoreError::Database(e.to_string()))?;

        Ok(())
    }

    /// Read-modify-write a single document inside one transaction.
    fn update<F>(&self, collection: Collection, id: &str, apply: F) -> Result<(), DocumentStoreError>
    where
        F: FnOnce(&mut Document),
    {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| DocumentStoreError::Database(e.to_string()))?;

        let mut document = Self::read(&tx, collection, id)?.unwrap_or_default();
        apply(&mut document);
        Self::write(&tx, collection, id, &document)?;

        tx.commit()
            .map_err(|e| DocumentStoreError::Database(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, DocumentStoreError> {
        let conn = self.lock()?;
        Self::read(&conn, collection, id)
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        document: Document,
    ) -> Result<(), DocumentStoreError> {
        let conn = self.lock()?;
        Self::write(&conn, collection, id, &document)
    }

    async fn merge(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<(), DocumentStoreError> {
        self.update(collection, id, |document| merge_fields(document, fields))
    }

    async fn array_union(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        values: Vec<Value>,
    ) -> Result<(), DocumentStoreError> {
        self.update(collection, id, |document| {
            union_array_field(document, field, values)
        })
    }
}
