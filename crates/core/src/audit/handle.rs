use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::AuditEvent;

/// An event stamped with the time it was emitted.
#[derive(Debug, Clone)]
pub struct AuditEventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

/// Sending side of the audit channel.
///
/// Clones share the channel; the [`AuditWriter`](super::AuditWriter) stops
/// once every clone is dropped.
#[derive(Clone)]
pub struct AuditHandle {
    tx: mpsc::Sender<AuditEventEnvelope>,
}

impl AuditHandle {
    pub fn new(tx: mpsc::Sender<AuditEventEnvelope>) -> Self {
        Self { tx }
    }

    /// Queue an event for the writer.
    ///
    /// Waits for channel capacity. A closed channel is logged and the event
    /// dropped; auditing never fails the caller.
    pub async fn emit(&self, event: AuditEvent) {
        let event_type = event.event_type();
        let envelope = AuditEventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        if self.tx.send(envelope).await.is_err() {
            tracing::error!(event_type, "Audit channel closed, event dropped");
        }
    }
}
