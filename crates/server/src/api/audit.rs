//! Audit log query endpoint.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use bugtrail_core::{AuditFilter, AuditRecord, DEFAULT_PAGE_SIZE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

const MAX_LIMIT: i64 = 1000;

/// Query parameters for the audit endpoint
#[derive(Debug, Deserialize)]
pub struct AuditQueryParams {
    pub ticket_id: Option<String>,
    /// Project the submission was filed against
    pub project_id: Option<String>,
    /// e.g. `ticket_created`, `submission_failed`
    pub event_type: Option<String>,
    /// Reporter the event concerns
    pub user_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Default 100, capped at 1000
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AuditQueryResponse {
    pub events: Vec<AuditRecord>,
    /// Matching events ignoring limit and offset
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Query audit events
pub async fn query_audit(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditQueryParams>,
) -> Result<Json<AuditQueryResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = match params.ticket_id {
        Some(ref ticket_id) => AuditFilter::for_ticket(ticket_id),
        None => AuditFilter::new(),
    };
    if let Some(ref project_id) = params.project_id {
        filter = filter.with_project_id(project_id);
    }
    if let Some(ref event_type) = params.event_type {
        filter = filter.with_event_type(event_type);
    }
    if let Some(ref user_id) = params.user_id {
        filter = filter.with_user_id(user_id);
    }
    if params.from.is_some() || params.to.is_some() {
        filter = filter.between(params.from, params.to);
    }

    let page = filter.clone().page(limit, offset);

    let events = state.audit_store().query(&page).map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to query audit events: {}", e),
        )
    })?;

    let total = state.audit_store().count(&filter).map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to count audit events: {}", e),
        )
    })?;

    Ok(Json(AuditQueryResponse {
        events,
        total,
        limit,
        offset,
    }))
}
