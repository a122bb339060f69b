use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: String,
}

/// Tags the request with a fresh id, runs it inside a span carrying that id
/// and echoes the id back in `x-request-id`.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    request.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });

    let span = info_span!("render_api", request_id = %request_id);
    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Which placeholder endpoint a path addresses, plus the job id for status reads.
fn classify_path(path: &str) -> (&'static str, Option<String>) {
    if path == "/healthz" {
        return ("health", None);
    }
    match path.strip_prefix("/api/render") {
        Some("" | "/") => ("create_job", None),
        Some(rest) => match rest.strip_prefix('/') {
            Some(job_id) => ("job_status", Some(job_id.to_string())),
            None => ("unrouted", None),
        },
        None => ("unrouted", None),
    }
}

/// Logs every answer of the placeholder API. Failures carry the handler's
/// [`ErrorReport`], which is taken off the response here.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let (endpoint, job_id) = classify_path(request.uri().path());
    let started = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();
    let latency_ms = started.elapsed().as_millis();
    let job_id = job_id.as_deref().unwrap_or("-");

    if status.is_success() {
        debug!(
            target = "tryon::http",
            endpoint,
            job_id,
            status = status.as_u16(),
            latency_ms,
            "render api answered"
        );
        return response;
    }

    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        warn!(
            target = "tryon::http",
            endpoint,
            job_id,
            status = status.as_u16(),
            latency_ms,
            "render api refused request without a report"
        );
        return response;
    };

    let reason = report.messages.join(": ");
    if status.is_server_error() {
        error!(
            target = "tryon::http",
            endpoint,
            job_id,
            status = status.as_u16(),
            latency_ms,
            handler = report.source,
            reason = %reason,
            "render api could not serve request"
        );
    } else {
        warn!(
            target = "tryon::http",
            endpoint,
            job_id,
            status = status.as_u16(),
            latency_ms,
            handler = report.source,
            reason = %reason,
            "render api rejected request"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::infra::http::build_router;

    #[test]
    fn endpoint_names_placeholder_routes() {
        assert_eq!(classify_path("/api/render"), ("create_job", None));
        assert_eq!(
            classify_path("/api/render/job%2042"),
            ("job_status", Some("job%2042".to_string()))
        );
        assert_eq!(classify_path("/healthz"), ("health", None));
        assert_eq!(classify_path("/api/renderer"), ("unrouted", None));
        assert_eq!(classify_path("/"), ("unrouted", None));
    }

    #[tokio::test]
    async fn responses_carry_a_request_id_and_drop_the_report() {
        let response = build_router(1024)
            .oneshot(
                Request::builder()
                    .uri("/api/render/42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .expect("request id header");
        assert!(Uuid::parse_str(request_id).is_ok());
        assert!(response.extensions().get::<ErrorReport>().is_none());
    }

    #[tokio::test]
    async fn each_request_gets_its_own_id() {
        let router = build_router(1024);
        let mut ids = Vec::new();
        for _ in 0..2 {
            let response = router
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/healthz")
                        .body(Body::empty())
                        .expect("request"),
                )
                .await
                .expect("response");
            ids.push(response.headers()[REQUEST_ID_HEADER].clone());
        }
        assert_ne!(ids[0], ids[1]);
    }
}
