pub mod audit;
pub mod auth;
pub mod config;
pub mod directory;
pub mod metrics;
pub mod objects;
pub mod store;
pub mod submission;
pub mod testing;
pub mod ticket;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditEventEnvelope, AuditFilter, AuditHandle,
    AuditRecord, AuditStore, AuditWriter, SqliteAuditStore, DEFAULT_PAGE_SIZE,
};
pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator, ANONYMOUS_USER,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, Config,
    ConfigError, DatabaseConfig, SanitizedConfig, ServerConfig, StorageConfig, SubmissionConfig,
    UserIndexMode,
};
pub use directory::{load_current_user, resolve_project, CurrentUser, UserLookupError};
pub use objects::{FsObjectStore, ObjectStore, ObjectStoreError};
pub use store::{Collection, Document, DocumentStore, DocumentStoreError, SqliteDocumentStore};
pub use submission::{
    FailedStep, ImageAttachment, Submission, SubmissionForm, SubmissionOutcome,
    SubmissionWarning, TicketSubmitter,
};
pub use ticket::{PersonRef, Priority, ProjectRef, StatusLogEntry, Ticket};
