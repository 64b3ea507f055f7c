use axum::{
    extract::{Path, State},
    Json,
};
use bugtrail_core::{resolve_project, ProjectRef};
use std::sync::Arc;

use crate::state::AppState;

/// Project reference; the name is empty when the project can't be read.
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Json<ProjectRef> {
    Json(resolve_project(state.documents(), &project_id).await)
}
