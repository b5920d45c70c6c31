pub mod middleware;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use middleware::resolve_identity;
pub use rest::{
    enroll_handler, health_handler, list_courses_handler, list_enrollments_handler,
    report_progress_handler,
};
use state::AppState;

/// Builds the API router. Routes that act on behalf of a user pass through
/// `resolve_identity` so their handlers always find a `RequestContext` in the
/// request extensions. The catalog and health routes are public.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/enroll", post(enroll_handler))
        .route("/progress", post(report_progress_handler))
        .route("/enrollments", get(list_enrollments_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            resolve_identity,
        ))
        .route("/courses", get(list_courses_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
