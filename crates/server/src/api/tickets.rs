//! Ticket read-back.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bugtrail_core::{Collection, Ticket};
use std::sync::Arc;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

/// Get a ticket by ID
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    match state.documents().get(Collection::Tickets, &id).await {
        Ok(Some(document)) => Ticket::from_document(document).map(Json).map_err(|e| {
            tracing::error!(ticket_id = %id, "Stored ticket is malformed: {}", e);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Malformed ticket {}: {}", id, e),
            )
        }),
        Ok(None) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Ticket not found: {}", id),
        )),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
