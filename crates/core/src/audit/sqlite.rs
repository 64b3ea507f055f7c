use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, types::Value, Connection};

use super::{AuditError, AuditEvent, AuditFilter, AuditRecord, AuditStore};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS audit_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        event_type TEXT NOT NULL,
        ticket_id TEXT,
        project_id TEXT,
        user_id TEXT,
        data TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_audit_events_timestamp ON audit_events(timestamp);
    CREATE INDEX IF NOT EXISTS idx_audit_events_ticket_id ON audit_events(ticket_id);
    CREATE INDEX IF NOT EXISTS idx_audit_events_project_id ON audit_events(project_id);
    CREATE INDEX IF NOT EXISTS idx_audit_events_event_type ON audit_events(event_type);
    CREATE INDEX IF NOT EXISTS idx_audit_events_user_id ON audit_events(user_id);
"#;

/// SQLite-backed audit store
pub struct SqliteAuditStore {
    conn: Mutex<Connection>,
}

impl SqliteAuditStore {
    /// Open (or create) the audit database at `path`.
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        let conn = Connection::open(path).map_err(|e| AuditError::Database(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self, AuditError> {
        let conn = Connection::open_in_memory().map_err(|e| AuditError::Database(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, AuditError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| AuditError::Database(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AuditError> {
        self.conn
            .lock()
            .map_err(|_| AuditError::Database("audit connection lock poisoned".to_string()))
    }
}

/// `WHERE` clause and its bound values for a filter; limit and offset excluded.
fn where_clause(filter: &AuditFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    let mut push = |condition: &'static str, value: Value| {
        conditions.push(condition);
        values.push(value);
    };

    if let Some(ticket_id) = &filter.ticket_id {
        push("ticket_id = ?", Value::from(ticket_id.clone()));
    }
    if let Some(project_id) = &filter.project_id {
        push("project_id = ?", Value::from(project_id.clone()));
    }
    if let Some(event_type) = &filter.event_type {
        push("event_type = ?", Value::from(event_type.clone()));
    }
    if let Some(user_id) = &filter.user_id {
        push("user_id = ?", Value::from(user_id.clone()));
    }
    if let Some(from) = &filter.from {
        push("timestamp >= ?", Value::from(from.to_rfc3339()));
    }
    if let Some(to) = &filter.to {
        push("timestamp <= ?", Value::from(to.to_rfc3339()));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", conditions.join(" AND ")), values)
    }
}

/// Columns of one `audit_events` row, before decoding.
struct Row {
    id: i64,
    timestamp: String,
    event_type: String,
    ticket_id: Option<String>,
    project_id: Option<String>,
    user_id: Option<String>,
    data: String,
}

impl Row {
    fn decode(self) -> Result<AuditRecord, AuditError> {
        let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| AuditError::Database(format!("Invalid timestamp: {}", e)))?
            .into();
        let data: AuditEvent = serde_json::from_str(&self.data)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;

        Ok(AuditRecord {
            id: self.id,
            timestamp,
            event_type: self.event_type,
            ticket_id: self.ticket_id,
            project_id: self.project_id,
            user_id: self.user_id,
            data,
        })
    }
}

impl AuditStore for SqliteAuditStore {
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError> {
        let data = serde_json::to_string(&record.data)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO audit_events \
             (timestamp, event_type, ticket_id, project_id, user_id, data) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.timestamp.to_rfc3339(),
                record.event_type,
                record.ticket_id,
                record.project_id,
                record.user_id,
                data,
            ],
        )
        .map_err(|e| AuditError::Database(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    /// Newest first.
    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
        let (clause, mut values) = where_clause(filter);
        values.push(Value::from(filter.limit));
        values.push(Value::from(filter.offset));

        let sql = format!(
            "SELECT id, timestamp, event_type, ticket_id, project_id, user_id, data \
             FROM audit_events {} \
             ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
            clause
        );

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AuditError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(Row {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    event_type: row.get(2)?,
                    ticket_id: row.get(3)?,
                    project_id: row.get(4)?,
                    user_id: row.get(5)?,
                    data: row.get(6)?,
                })
            })
            .map_err(|e| AuditError::Database(e.to_string()))?;

        let records: Result<Vec<_>, _> = rows
            .map(|row| row.map_err(|e| AuditError::Database(e.to_string()))?.decode())
            .collect();
        records
    }

    fn count(&self, filter: &AuditFilter) -> Result<i64, AuditError> {
        let (clause, values) = where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM audit_events {}", clause);

        self.lock()?
            .query_row(&sql, params_from_iter(values), |row| row.get(0))
            .map_err(|e| AuditError::Database(e.to_string()))
    }
}
