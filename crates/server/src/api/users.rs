//! Signed-in user profile.

use axum::{extract::State, http::StatusCode, Json};
use bugtrail_core::{load_current_user, CurrentUser, UserLookupError};
use std::sync::Arc;

use super::handlers::{api_error, ApiError};
use super::middleware::AuthUser;
use crate::state::AppState;

/// Load the profile of the authenticated user, mapped to an HTTP error.
///
/// A user without a profile document isn't allowed to report defects.
pub async fn current_user(state: &AppState, user_id: &str) -> Result<CurrentUser, ApiError> {
    load_current_user(state.documents(), user_id)
        .await
        .map_err(|e| match e {
            UserLookupError::NotFound(_) => {
                tracing::warn!(user_id = %user_id, "Request from user without a profile");
                api_error(StatusCode::FORBIDDEN, e.to_string())
            }
            UserLookupError::Malformed { .. } => {
                tracing::error!(user_id = %user_id, "{}", e);
                api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            UserLookupError::Store(ref inner) => {
                tracing::error!(user_id = %user_id, "Couldn't load user profile: {}", inner);
                api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
        })
}

/// Current user snapshot, including the ticket index.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CurrentUser>, ApiError> {
    current_user(&state, &user_id).await.map(Json)
}
