use std::sync::Arc;

use bugtrail_core::{
    AuditHandle, AuditStore, Authenticator, Config, DocumentStore, ObjectStore, SanitizedConfig,
    TicketSubmitter,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    audit_store: Arc<dyn AuditStore>,
    documents: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    submitter: TicketSubmitter,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        audit_handle: AuditHandle,
        audit_store: Arc<dyn AuditStore>,
        documents: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        let submitter = TicketSubmitter::new(
            Arc::clone(&documents),
            Arc::clone(&objects),
            config.submission.clone(),
        )
        .with_audit(audit_handle);

        Self {
            config,
            authenticator,
            audit_store,
            documents,
            objects,
            submitter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn documents(&self) -> &dyn DocumentStore {
        self.documents.as_ref()
    }

    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    pub fn submitter(&self) -> &TicketSubmitter {
        &self.submitter
    }
}
