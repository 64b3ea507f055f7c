//! The defect submission workflow.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::types::{
    ImageAttachment, Submission, SubmissionForm, SubmissionOutcome, SubmissionWarning,
};
use crate::audit::{AuditEvent, AuditHandle};
use crate::config::{SubmissionConfig, UserIndexMode};
use crate::directory::{CurrentUser, MY_TICKETS_FIELD};
use crate::metrics;
use crate::objects::{
    image_key, ObjectStore, ObjectStoreError, UploadProgress, UploadRequest, UploadState,
};
use crate::store::{Collection, Document, DocumentStore, DocumentStoreError};
use crate::ticket::{
    PersonRef, Priority, ProjectRef, StatusLogEntry, Ticket, STATUS_UNASSIGNED,
};

/// Buffer for upload progress updates. Updates are only logged.
const PROGRESS_BUFFER: usize = 32;

/// Creates defect tickets from submitted forms.
///
/// A submission is a linear chain: optional image upload, then the ticket
/// write. The reporter's ticket index is updated on a separate task started
/// before the chain and never awaited by it. Nothing is rolled back.
pub struct TicketSubmitter {
    documents: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    config: SubmissionConfig,
    audit: Option<AuditHandle>,
}

impl TicketSubmitter {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            documents,
            objects,
            config,
            audit: None,
        }
    }

    /// Emit audit events for every submission.
    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    /// Submit a defect report on behalf of `user` against `project`.
    ///
    /// `user.my_tickets` is used as-is for the index write; it is not re-read.
    pub async fn submit(
        &self,
        form: SubmissionForm,
        user: &CurrentUser,
        project: ProjectRef,
    ) -> Submission {
        let started = Instant::now();
        let ticket_id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        let SubmissionForm {
            title,
            description,
            priority,
            image,
        } = form;

        let mut warnings = Vec::new();
        let image = match image {
            Some(image) if image.size_bytes() > self.config.max_image_bytes => {
                self.reject_image(
                    &ticket_id,
                    &user.id,
                    &project.project_id,
                    &image,
                    &mut warnings,
                )
                .await;
                None
            }
            other => other,
        };

        let index_update = self.spawn_index_update(&ticket_id, user);

        let image_url = match image {
            Some(image) => match self
                .store_image(&ticket_id, &user.id, &project.project_id, image)
                .await
            {
                Ok(url) => url,
                Err(error) => {
                    tracing::error!(
                        ticket_id = %ticket_id,
                        error = %error,
                        "Image upload failed, ticket not written"
                    );
                    self.emit(AuditEvent::SubmissionFailed {
                        ticket_id: ticket_id.clone(),
                        owner_id: user.id.clone(),
                        project_id: project.project_id.clone(),
                        step: "upload".to_string(),
                        error: error.to_string(),
                        orphaned_image_url: None,
                    })
                    .await;
                    let outcome = SubmissionOutcome::UploadFailed {
                        ticket_id,
                        error,
                        warnings,
                    };
                    record_outcome(&outcome, started);
                    return Submission {
                        outcome,
                        index_update,
                    };
                }
            },
            None => String::new(),
        };

        let ticket = Ticket {
            id: ticket_id.clone(),
            owner: user.person_ref(),
            project,
            title,
            description,
            image_url,
            priority: Priority::parse(&priority),
            created_at,
            status: STATUS_UNASSIGNED.to_string(),
            assignee: PersonRef::empty(),
            logs: vec![StatusLogEntry::created(
                &user.display_name,
                &user.role,
                created_at,
            )],
            comments: Vec::new(),
        };

        let outcome = match self.write_ticket(&ticket).await {
            Ok(()) => {
                tracing::info!(
                    ticket_id = %ticket.id,
                    project_id = %ticket.project.project_id,
                    owner = %user.id,
                    has_image = ticket.has_image(),
                    "Ticket created"
                );
                metrics::TICKETS_CREATED
                    .with_label_values(&[ticket.priority.metric_label()])
                    .inc();
                self.emit(AuditEvent::TicketCreated {
                    ticket_id: ticket.id.clone(),
                    owner_id: user.id.clone(),
                    project_id: ticket.project.project_id.clone(),
                    priority: ticket.priority.label().to_string(),
                    has_image: ticket.has_image(),
                })
                .await;
                SubmissionOutcome::Created { ticket, warnings }
            }
            Err(error) => {
                tracing::error!(
                    ticket_id = %ticket.id,
                    error = %error,
                    "Ticket write failed"
                );
                if ticket.has_image() {
                    tracing::warn!(
                        ticket_id = %ticket.id,
                        image_url = %ticket.image_url,
                        "Uploaded image has no ticket"
                    );
                }
                self.emit(AuditEvent::SubmissionFailed {
                    ticket_id: ticket.id.clone(),
                    owner_id: user.id.clone(),
                    project_id: ticket.project.project_id.clone(),
                    step: "write".to_string(),
                    error: error.to_string(),
                    orphaned_image_url: ticket.has_image().then(|| ticket.image_url.clone()),
                })
                .await;
                SubmissionOutcome::WriteFailed {
                    ticket_id: ticket.id,
                    image_url: ticket.image_url,
                    error,
                    warnings,
                }
            }
        };

        record_outcome(&outcome, started);
        Submission {
            outcome,
            index_update,
        }
    }

    async fn reject_image(
        &self,
        ticket_id: &str,
        owner_id: &str,
        project_id: &str,
        image: &ImageAttachment,
        warnings: &mut Vec<SubmissionWarning>,
    ) {
        let size_bytes = image.size_bytes();
        let max_bytes = self.config.max_image_bytes;

        tracing::warn!(
            ticket_id = %ticket_id,
            size_bytes,
            max_bytes,
            file_name = image.file_name.as_deref().unwrap_or(""),
            "Image too large, submitting without it"
        );
        metrics::IMAGES_REJECTED.inc();
        self.emit(AuditEvent::ImageRejected {
            ticket_id: ticket_id.to_string(),
            owner_id: owner_id.to_string(),
            project_id: project_id.to_string(),
            size_bytes,
            max_bytes,
        })
        .await;

        warnings.push(SubmissionWarning::ImageTooLarge {
            size_bytes,
            max_bytes,
        });
    }

    /// Upload the image and resolve its download URL.
    async fn store_image(
        &self,
        ticket_id: &str,
        owner_id: &str,
        project_id: &str,
        image: ImageAttachment,
    ) -> Result<String, ObjectStoreError> {
        let request = UploadRequest {
            key: image_key(ticket_id),
            data: image.data,
            content_type: self.config.image_content_type.clone(),
        };

        let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_BUFFER);
        let logger = tokio::spawn(log_upload_progress(progress_rx));
        let result = self.objects.upload_with_progress(request, progress_tx).await;
        // The sender is gone once the upload returns, so the logger drains and exits.
        let _ = logger.await;
        let metadata = result?;

        metrics::IMAGE_UPLOAD_BYTES.inc_by(metadata.size_bytes);
        self.emit(AuditEvent::ImageUploaded {
            ticket_id: ticket_id.to_string(),
            owner_id: owner_id.to_string(),
            project_id: project_id.to_string(),
            key: metadata.key.clone(),
            size_bytes: metadata.size_bytes,
        })
        .await;

        self.objects.download_url(&metadata.key).await
    }

    async fn write_ticket(&self, ticket: &Ticket) -> Result<(), DocumentStoreError> {
        let document = ticket
            .to_document()
            .map_err(|e| DocumentStoreError::Serialization(e.to_string()))?;
        self.documents
            .set(Collection::Tickets, &ticket.id, document)
            .await
    }

    /// Start the write that adds `ticket_id` to the reporter's ticket index.
    fn spawn_index_update(
        &self,
        ticket_id: &str,
        user: &CurrentUser,
    ) -> JoinHandle<Result<(), DocumentStoreError>> {
        let documents = Arc::clone(&self.documents);
        let audit = self.audit.clone();
        let mode = self.config.user_index;
        let ticket_id = ticket_id.to_string();
        let user_id = user.id.clone();
        let snapshot = user.my_tickets.clone();

        tokio::spawn(async move {
            let result = match mode {
                UserIndexMode::Merge => {
                    let mut my_tickets: Vec<Value> =
                        snapshot.into_iter().map(Value::String).collect();
                    my_tickets.push(Value::String(ticket_id.clone()));

                    let mut fields = Document::new();
                    fields.insert(MY_TICKETS_FIELD.to_string(), Value::Array(my_tickets));
                    documents.merge(Collection::Users, &user_id, fields).await
                }
                UserIndexMode::ArrayUnion => {
                    documents
                        .array_union(
                            Collection::Users,
                            &user_id,
                            MY_TICKETS_FIELD,
                            vec![Value::String(ticket_id.clone())],
                        )
                        .await
                }
            };

            match &result {
                Ok(()) => {
                    metrics::USER_INDEX_WRITES
                        .with_label_values(&[mode.as_str(), "success"])
                        .inc();
                    tracing::debug!(
                        ticket_id = %ticket_id,
                        user_id = %user_id,
                        mode = mode.as_str(),
                        "Ticket index updated"
                    );
                }
                Err(e) => {
                    metrics::USER_INDEX_WRITES
                        .with_label_values(&[mode.as_str(), "error"])
                        .inc();
                    tracing::error!(
                        ticket_id = %ticket_id,
                        user_id = %user_id,
                        error = %e,
                        "Failed to update ticket index"
                    );
                    if let Some(audit) = audit {
                        audit
                            .emit(AuditEvent::UserIndexUpdateFailed {
                                ticket_id: ticket_id.clone(),
                                owner_id: user_id.clone(),
                                error: e.to_string(),
                            })
                            .await;
                    }
                }
            }

            result
        })
    }

    async fn emit(&self, event: AuditEvent) {
        if let Some(ref audit) = self.audit {
            audit.emit(event).await;
        }
    }
}

fn record_outcome(outcome: &SubmissionOutcome, started: Instant) {
    let label = outcome.result_label();
    metrics::SUBMISSIONS_TOTAL.with_label_values(&[label]).inc();
    metrics::SUBMISSION_DURATION
        .with_label_values(&[label])
        .observe(started.elapsed().as_secs_f64());
}

async fn log_upload_progress(mut rx: mpsc::Receiver<UploadProgress>) {
    while let Some(progress) = rx.recv().await {
        match progress.state {
            UploadState::Queued => {
                tracing::debug!(key = %progress.key, "Upload queued");
            }
            UploadState::Running => {
                tracing::debug!(
                    key = %progress.key,
                    bytes = progress.bytes_transferred,
                    total = progress.total_bytes,
                    "Upload is {:.0}% done",
                    progress.percent()
                );
            }
            UploadState::Paused => {
                tracing::info!(key = %progress.key, "Upload is paused");
            }
            UploadState::Success => {
                tracing::info!(
                    key = %progress.key,
                    total = progress.total_bytes,
                    "Upload complete"
                );
            }
        }
    }
}
