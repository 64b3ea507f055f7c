//! Serves uploaded objects at their download URLs.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bugtrail_core::ObjectStoreError;
use std::sync::Arc;

use super::handlers::api_error;
use crate::state::AppState;

pub async fn get_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    match state.objects().fetch(&key).await {
        Ok(Some(object)) => (
            [
                (header::CONTENT_TYPE, object.metadata.content_type),
                (header::ETAG, format!("\"{}\"", object.metadata.sha256)),
            ],
            object.data,
        )
            .into_response(),
        Ok(None) | Err(ObjectStoreError::NotFound { .. }) => {
            api_error(StatusCode::NOT_FOUND, format!("Object not found: {}", key)).into_response()
        }
        Err(e @ ObjectStoreError::InvalidKey { .. }) => {
            api_error(StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!(key = %key, "Couldn't read object: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
