use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tryon_api_types::RenderErrorBody;

use crate::application::error::ErrorReport;

/// JSON `{error}` response with a diagnostic report for the logging middleware.
#[derive(Debug)]
pub struct StubError {
    source: &'static str,
    status: StatusCode,
    message: String,
    detail: Option<String>,
}

impl StubError {
    pub fn new(source: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            source,
            status,
            message: message.into(),
            detail: None,
        }
    }

    pub fn bad_request(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(source, StatusCode::BAD_REQUEST, message)
    }

    /// Extra context that is logged but not sent to the client.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let logged = match &self.detail {
            Some(detail) => format!("{}: {detail}", self.message),
            None => self.message.clone(),
        };
        let mut response = (
            self.status,
            Json(RenderErrorBody {
                error: self.message,
            }),
        )
            .into_response();
        ErrorReport::from_message(self.source, self.status, logged).attach(&mut response);
        response
    }
}
