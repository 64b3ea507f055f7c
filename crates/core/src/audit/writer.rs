use std::sync::Arc;

use tokio::sync::mpsc;

use super::{AuditEventEnvelope, AuditHandle, AuditRecord, AuditStore};

/// Drains the audit channel into an [`AuditStore`].
pub struct AuditWriter {
    rx: mpsc::Receiver<AuditEventEnvelope>,
    store: Arc<dyn AuditStore>,
}

impl AuditWriter {
    pub fn new(rx: mpsc::Receiver<AuditEventEnvelope>, store: Arc<dyn AuditStore>) -> Self {
        Self { rx, store }
    }

    /// Write events until every [`AuditHandle`] is dropped.
    ///
    /// A failed insert is logged and skipped.
    pub async fn run(mut self) {
        tracing::info!("Audit writer started");
        let mut written = 0u64;
        let mut failed = 0u64;

        while let Some(envelope) = self.rx.recv().await {
            let record = AuditRecord::new(envelope.timestamp, envelope.event);
            match self.store.insert(&record) {
                Ok(_) => written += 1,
                Err(e) => {
                    failed += 1;
                    tracing::error!("Failed to write audit event: {}", e);
                }
            }
        }

        tracing::info!(written, failed, "Audit writer shutting down");
    }
}

/// Wire a handle to a writer over a channel of `buffer_size` events.
///
/// Spawn the writer with `tokio::spawn(writer.run())` and clone the handle
/// wherever events are emitted. `emit` waits while the buffer is full.
pub fn create_audit_system(
    store: Arc<dyn AuditStore>,
    buffer_size: usize,
) -> (AuditHandle, AuditWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (AuditHandle::new(tx), AuditWriter::new(rx, store))
}
