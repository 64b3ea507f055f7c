use chrono::{DateTime, Utc};
use thiserror::Error;

use super::AuditRecord;

/// Page size used when a query names none.
pub const DEFAULT_PAGE_SIZE: i64 = 100;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit database error: {0}")]
    Database(String),

    #[error("Audit event could not be encoded: {0}")]
    Serialization(String),
}

/// Which audit records a query returns.
///
/// Every field that is set must match; unset fields match anything. The time
/// bounds are inclusive. `limit` and `offset` page the result and are ignored
/// by [`AuditStore::count`].
#[derive(Debug, Clone)]
pub struct AuditFilter {
    pub ticket_id: Option<String>,
    pub project_id: Option<String>,
    pub user_id: Option<String>,
    pub event_type: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self {
            ticket_id: None,
            project_id: None,
            user_id: None,
            event_type: None,
            from: None,
            to: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl AuditFilter {
    /// Matches every record, first page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded about one ticket.
    pub fn for_ticket(ticket_id: impl Into<String>) -> Self {
        Self {
            ticket_id: Some(ticket_id.into()),
            ..Self::default()
        }
    }

    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Whether `record` passes the filter, ignoring paging.
    pub fn matches(&self, record: &AuditRecord) -> bool {
        fn same(wanted: &Option<String>, actual: &Option<String>) -> bool {
            wanted.is_none() || wanted == actual
        }

        same(&self.ticket_id, &record.ticket_id)
            && same(&self.project_id, &record.project_id)
            && same(&self.user_id, &record.user_id)
            && self
                .event_type
                .as_ref()
                .is_none_or(|event_type| *event_type == record.event_type)
            && self.from.is_none_or(|from| record.timestamp >= from)
            && self.to.is_none_or(|to| record.timestamp <= to)
    }
}

/// Durable log of what happened to submissions.
///
/// Calls are synchronous; the [`AuditWriter`](super::AuditWriter) is the only
/// caller on the write path.
pub trait AuditStore: Send + Sync {
    /// Store `record` and return its id. `record.id` is ignored.
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError>;

    /// One page of matching records, newest first.
    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError>;

    /// Number of matching records across all pages.
    fn count(&self, filter: &AuditFilter) -> Result<i64, AuditError>;
}
