//! Defect submission endpoint.

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bugtrail_core::{
    resolve_project, FailedStep, ImageAttachment, SubmissionForm, SubmissionOutcome,
    SubmissionWarning, Ticket,
};
use serde::Serialize;
use std::sync::Arc;

use super::handlers::{api_error, ApiError};
use super::middleware::AuthUser;
use super::users::current_user;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Body of a 201 response.
#[derive(Debug, Serialize)]
pub struct SubmitDefectResponse {
    pub ticket: Ticket,
    pub warnings: Vec<SubmissionWarning>,
    /// Always true: the client clears its form after a successful submission.
    pub reset_form: bool,
}

/// Form values echoed back after a failed submission so the client can keep them.
#[derive(Debug, Clone, Serialize)]
pub struct RetainedForm {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub image_file_name: Option<String>,
}

impl RetainedForm {
    fn of(form: &SubmissionForm) -> Self {
        Self {
            title: form.title.clone(),
            description: form.description.clone(),
            priority: form.priority.clone(),
            image_file_name: form.image.as_ref().and_then(|i| i.file_name.clone()),
        }
    }
}

/// Body of a 502 response.
#[derive(Debug, Serialize)]
pub struct SubmitDefectFailure {
    pub error: String,
    pub failed_step: FailedStep,
    pub ticket_id: String,
    pub warnings: Vec<SubmissionWarning>,
    pub form: RetainedForm,
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a defect report against a project.
///
/// Accepts a multipart form with `title`, `description`, `priority` and an
/// optional `image` file. Returns 201 once the ticket is written, or 502 with
/// the failed step and the submitted values when the upload or write fails.
pub async fn submit_defect(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(project_id): Path<String>,
    multipart: Multipart,
) -> Response {
    let max_image_bytes = state.submitter().config().max_image_bytes;
    let form = match read_form(multipart, max_image_bytes).await {
        Ok(form) => form,
        Err(e) => return e.into_response(),
    };

    let user = match current_user(&state, &user_id).await {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };

    let project = resolve_project(state.documents(), &project_id).await;
    let retained = RetainedForm::of(&form);

    tracing::info!(
        user_id = %user.id,
        project_id = %project_id,
        has_image = form.image.is_some(),
        "Submitting defect"
    );

    // The index update keeps running after the handle is dropped.
    let submission = state.submitter().submit(form, &user, project).await;

    match submission.outcome {
        SubmissionOutcome::Created { ticket, warnings } => (
            StatusCode::CREATED,
            Json(SubmitDefectResponse {
                ticket,
                warnings,
                reset_form: true,
            }),
        )
            .into_response(),
        outcome => {
            let failure = SubmitDefectFailure {
                error: outcome.error_message().unwrap_or_default(),
                failed_step: outcome.failed_step().unwrap_or(FailedStep::Write),
                ticket_id: outcome.ticket_id().to_string(),
                warnings: outcome.warnings().to_vec(),
                form: retained,
            };
            (StatusCode::BAD_GATEWAY, Json(failure)).into_response()
        }
    }
}

/// Longest accepted value of a text field.
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Collect the multipart fields into a form. Unknown fields are ignored.
///
/// At most `max_image_bytes + 1` bytes of the image are kept; the rest is
/// counted and discarded so an oversized file still gets its size reported.
async fn read_form(
    mut multipart: Multipart,
    max_image_bytes: u64,
) -> Result<SubmissionForm, ApiError> {
    let mut form = SubmissionForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid multipart body: {}", e),
                ))
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" => form.title = read_text(field).await?,
            "description" => form.description = read_text(field).await?,
            "priority" => form.priority = read_text(field).await?,
            "image" => form.image = read_image(field, max_image_bytes).await?,
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(mut field: Field<'_>) -> Result<String, ApiError> {
    let name = field.name().unwrap_or("").to_string();
    let mut buf = Vec::new();

    while let Some(chunk) = field.chunk().await.map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Failed to read form field: {}", e),
        )
    })? {
        if buf.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(api_error(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "Field '{}' exceeds {} bytes",
                    name, MAX_TEXT_FIELD_BYTES
                ),
            ));
        }
        buf.extend_from_slice(&chunk);
    }

    String::from_utf8(buf).map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Field '{}' is not valid UTF-8", name),
        )
    })
}

/// An empty file part without a file name means no image was picked.
async fn read_image(
    mut field: Field<'_>,
    max_image_bytes: u64,
) -> Result<Option<ImageAttachment>, ApiError> {
    let file_name = field
        .file_name()
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string());
    let content_type = field.content_type().map(|ct| ct.to_string());

    let keep = usize::try_from(max_image_bytes.saturating_add(1)).unwrap_or(usize::MAX);
    let mut data = Vec::new();
    let mut received: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Failed to read image: {}", e),
        )
    })? {
        received += chunk.len() as u64;
        if data.len() < keep {
            let take = chunk.len().min(keep - data.len());
            data.extend_from_slice(&chunk[..take]);
        }
    }

    if received == 0 && file_name.is_none() {
        return Ok(None);
    }

    let received_bytes = (received > data.len() as u64).then_some(received);
    if received_bytes.is_some() {
        tracing::debug!(
            received,
            kept = data.len(),
            "Image exceeds the size limit, discarded the remainder"
        );
    }

    Ok(Some(ImageAttachment {
        data,
        content_type,
        file_name,
        received_bytes,
    }))
}
