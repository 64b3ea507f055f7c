use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{audit, defects, handlers, objects, projects, tickets, users};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Routes that require an authenticated caller
    let protected = Router::new()
        .route("/config", get(handlers::get_config))
        .route("/me", get(users::get_me))
        .route("/projects/{project_id}", get(projects::get_project))
        .route(
            "/projects/{project_id}/defects",
            // Image bytes past the size limit are discarded while streaming.
            post(defects::submit_defect).layer(DefaultBodyLimit::disable()),
        )
        .route("/tickets/{id}", get(tickets::get_ticket))
        .route("/audit", get(audit::query_audit))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .route("/objects/{*key}", get(objects::get_object))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
