use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Submission events
    /// A ticket document was written.
    TicketCreated {
        ticket_id: String,
        /// Reporter's user id
        owner_id: String,
        project_id: String,
        priority: String,
        has_image: bool,
    },
    /// The attached image was stored.
    ImageUploaded {
        ticket_id: String,
        owner_id: String,
        project_id: String,
        /// Object key the bytes were stored under
        key: String,
        size_bytes: u64,
    },
    /// The attached image exceeded the size limit and was dropped.
    ImageRejected {
        ticket_id: String,
        owner_id: String,
        project_id: String,
        size_bytes: u64,
        max_bytes: u64,
    },
    /// A submission stopped before its ticket was written.
    SubmissionFailed {
        ticket_id: String,
        owner_id: String,
        project_id: String,
        /// Step that failed: "upload" or "write"
        step: String,
        error: String,
        /// Uploaded image left behind without a ticket
        #[serde(default, skip_serializing_if = "Option::is_none")]
        orphaned_image_url: Option<String>,
    },
    /// The reporter's ticket index could not be updated.
    UserIndexUpdateFailed {
        ticket_id: String,
        owner_id: String,
        error: String,
    },
}

impl AuditEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::TicketCreated { .. } => "ticket_created",
            Self::ImageUploaded { .. } => "image_uploaded",
            Self::ImageRejected { .. } => "image_rejected",
            Self::SubmissionFailed { .. } => "submission_failed",
            Self::UserIndexUpdateFailed { .. } => "user_index_update_failed",
        }
    }

    /// Extract ticket_id if this event is ticket-related
    pub fn ticket_id(&self) -> Option<&str> {
        match self {
            Self::TicketCreated { ticket_id, .. }
            | Self::ImageUploaded { ticket_id, .. }
            | Self::ImageRejected { ticket_id, .. }
            | Self::SubmissionFailed { ticket_id, .. }
            | Self::UserIndexUpdateFailed { ticket_id, .. } => Some(ticket_id),
            Self::ServiceStarted { .. } | Self::ServiceStopped { .. } => None,
        }
    }

    /// Extract user_id if this event was triggered by a user action
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::TicketCreated { owner_id, .. }
            | Self::ImageUploaded { owner_id, .. }
            | Self::ImageRejected { owner_id, .. }
            | Self::SubmissionFailed { owner_id, .. }
            | Self::UserIndexUpdateFailed { owner_id, .. } => Some(owner_id),
            Self::ServiceStarted { .. } | Self::ServiceStopped { .. } => None,
        }
    }

    /// Project the submission was filed against. The ticket index lives on
    /// the user, so its failures carry no project.
    pub fn project_id(&self) -> Option<&str> {
        match self {
            Self::TicketCreated { project_id, .. }
            | Self::ImageUploaded { project_id, .. }
            | Self::ImageRejected { project_id, .. }
            | Self::SubmissionFailed { project_id, .. } => Some(project_id),
            Self::UserIndexUpdateFailed { .. }
            | Self::ServiceStarted { .. }
            | Self::ServiceStopped { .. } => None,
        }
    }
}

/// A stored audit record with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub ticket_id: Option<String>,
    pub project_id: Option<String>,
    pub user_id: Option<String>,
    pub data: AuditEvent,
}

impl AuditRecord {
    /// Unsaved record for `event`; the store assigns `id`.
    pub fn new(timestamp: DateTime<Utc>, event: AuditEvent) -> Self {
        Self {
            id: 0,
            timestamp,
            event_type: event.event_type().to_string(),
            ticket_id: event.ticket_id().map(String::from),
            project_id: event.project_id().map(String::from),
            user_id: event.user_id().map(String::from),
            data: event,
        }
    }
}
