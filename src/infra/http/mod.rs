mod error;
mod middleware;
mod render_stub;

pub use error::StubError;
pub use middleware::RequestContext;
pub use render_stub::{NOT_WIRED_MESSAGE, RenderSubmission};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
};

use middleware::{log_responses, set_request_context};

/// Router for the placeholder render API.
///
/// Request bodies above `body_limit` bytes are rejected before the handler
/// finishes reading them.
pub fn build_router(body_limit: usize) -> Router {
    Router::new()
        .route("/api/render", post(render_stub::create_render_job))
        .route("/api/render/{job_id}", get(render_stub::render_job_status))
        .route("/healthz", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
