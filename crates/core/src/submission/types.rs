//! Submission inputs and outcomes.

use std::fmt;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::objects::ObjectStoreError;
use crate::store::DocumentStoreError;
use crate::ticket::Ticket;

/// An image picked by the reporter.
#[derive(Debug, Clone, Default)]
pub struct ImageAttachment {
    pub data: Vec<u8>,
    /// Content type declared by the client. Not used for storage.
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    /// Full size of the file when `data` only holds its first bytes.
    pub received_bytes: Option<u64>,
}

impl ImageAttachment {
    /// Size of the picked file, whether or not all of it was kept.
    pub fn size_bytes(&self) -> u64 {
        self.received_bytes.unwrap_or(self.data.len() as u64)
    }
}

/// Snapshot of the defect form at the moment it was submitted.
///
/// Nothing is validated here: empty fields and the placeholder priority are
/// accepted and stored as given.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub image: Option<ImageAttachment>,
}

impl SubmissionForm {
    /// Reset every field, as after a successful submission.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.description.is_empty()
            && self.priority.is_empty()
            && self.image.is_none()
    }
}

/// Non-fatal problem found while accepting a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionWarning {
    /// The image was dropped and the ticket created without it.
    ImageTooLarge { size_bytes: u64, max_bytes: u64 },
}

impl fmt::Display for SubmissionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionWarning::ImageTooLarge {
                size_bytes,
                max_bytes,
            } => write!(
                f,
                "Image of {} bytes exceeds the {} byte limit and was not attached",
                size_bytes, max_bytes
            ),
        }
    }
}

/// Step at which a submission stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStep {
    Upload,
    Write,
}

impl FailedStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailedStep::Upload => "upload",
            FailedStep::Write => "write",
        }
    }
}

impl fmt::Display for FailedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the upload and ticket-write chain.
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// The ticket document was written.
    Created {
        ticket: Ticket,
        warnings: Vec<SubmissionWarning>,
    },
    /// Image upload or URL retrieval failed. No ticket was written.
    UploadFailed {
        ticket_id: String,
        error: ObjectStoreError,
        warnings: Vec<SubmissionWarning>,
    },
    /// The ticket write failed. An uploaded image stays behind.
    WriteFailed {
        ticket_id: String,
        /// Empty when no image was uploaded.
        image_url: String,
        error: DocumentStoreError,
        warnings: Vec<SubmissionWarning>,
    },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Created { .. })
    }

    /// Whether the caller should clear its form. Failed submissions keep the input.
    pub fn should_reset_form(&self) -> bool {
        self.is_success()
    }

    pub fn ticket_id(&self) -> &str {
        match self {
            SubmissionOutcome::Created { ticket, .. } => &ticket.id,
            SubmissionOutcome::UploadFailed { ticket_id, .. }
            | SubmissionOutcome::WriteFailed { ticket_id, .. } => ticket_id,
        }
    }

    pub fn warnings(&self) -> &[SubmissionWarning] {
        match self {
            SubmissionOutcome::Created { warnings, .. }
            | SubmissionOutcome::UploadFailed { warnings, .. }
            | SubmissionOutcome::WriteFailed { warnings, .. } => warnings,
        }
    }

    pub fn failed_step(&self) -> Option<FailedStep> {
        match self {
            SubmissionOutcome::Created { .. } => None,
            SubmissionOutcome::UploadFailed { .. } => Some(FailedStep::Upload),
            SubmissionOutcome::WriteFailed { .. } => Some(FailedStep::Write),
        }
    }

    /// Error message of a failed submission.
    pub fn error_message(&self) -> Option<String> {
        match self {
            SubmissionOutcome::Created { .. } => None,
            SubmissionOutcome::UploadFailed { error, .. } => Some(error.to_string()),
            SubmissionOutcome::WriteFailed { error, .. } => Some(error.to_string()),
        }
    }

    /// Label used for metrics.
    pub fn result_label(&self) -> &'static str {
        match self {
            SubmissionOutcome::Created { .. } => "created",
            SubmissionOutcome::UploadFailed { .. } => "upload_failed",
            SubmissionOutcome::WriteFailed { .. } => "write_failed",
        }
    }
}

/// A finished submission chain plus the user-index write it dispatched.
///
/// The index write runs on its own task and may finish before or after the
/// outcome is known. Dropping the handle does not cancel it.
#[derive(Debug)]
pub struct Submission {
    pub outcome: SubmissionOutcome,
    pub index_update: JoinHandle<Result<(), DocumentStoreError>>,
}
