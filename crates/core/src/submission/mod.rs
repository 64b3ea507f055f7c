//! Defect submission: turns a submitted form into a persisted ticket.
//!
//! # Example
//!
//! ```rust,ignore
//! let submitter = TicketSubmitter::new(documents, objects, config.submission.clone())
//!     .with_audit(audit_handle);
//!
//! let project = resolve_project(documents.as_ref(), "p1").await;
//! let submission = submitter.submit(form, &current_user, project).await;
//!
//! if submission.outcome.should_reset_form() {
//!     form.clear();
//! }
//! ```

mod submitter;
mod types;

pub use submitter::TicketSubmitter;
pub use types::{
    FailedStep, ImageAttachment, Submission, SubmissionForm, SubmissionOutcome, SubmissionWarning,
};
