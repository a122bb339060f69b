use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use bytes::Bytes;
use httpmock::MockServer;
use tokio::net::TcpListener;
use tryon::application::render::{
    DownloadError, PollError, RenderApi, RenderRequest, SubmissionError,
};
use tryon::domain::render_jobs::{JobId, RenderJobState};
use tryon::domain::selfie::Selfie;
use tryon::infra::render_client::HttpRenderApi;
use tryon_api_types::{CreateRenderJobResponse, FIELD_IMAGE};
use url::Url;

type TextFields = Arc<Mutex<Vec<(String, String)>>>;

fn api(server: &MockServer) -> HttpRenderApi {
    let base = Url::parse(&format!("{}/", server.base_url())).expect("base url");
    HttpRenderApi::new(base, Duration::from_secs(5)).expect("client")
}

fn request(style_id: &str) -> RenderRequest {
    RenderRequest {
        selfie: Selfie::new("me.jpg", "image/jpeg", Bytes::from_static(b"\xFF\xD8\xFFselfie"))
            .expect("selfie"),
        style_id: style_id.to_string(),
    }
}

fn job(id: &str) -> JobId {
    JobId::parse(id).expect("job id")
}

#[tokio::test]
async fn create_job_returns_the_job_id() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/api/render");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"jobId":"42"}"#);
    });

    let job_id = api(&server)
        .create_job(request("mid-fade"))
        .await
        .expect("job created");

    assert_eq!(job_id.as_str(), "42");
    mock.assert();
}

async fn record_text_fields(
    State(fields): State<TextFields>,
    mut multipart: Multipart,
) -> Json<CreateRenderJobResponse> {
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let name = field.name().unwrap_or_default().to_string();
        if name == FIELD_IMAGE {
            field.bytes().await.expect("image bytes");
            continue;
        }
        let value = field.text().await.expect("text field");
        fields.lock().expect("fields").push((name, value));
    }
    Json(CreateRenderJobResponse {
        job_id: Some("42".to_string()),
    })
}

#[tokio::test]
async fn create_job_sends_style_id_and_jpg_format() {
    let fields = TextFields::default();
    let router = Router::new()
        .route("/api/render", post(record_text_fields))
        .with_state(fields.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    let base = Url::parse(&format!("http://{addr}/")).expect("base url");
    let api = HttpRenderApi::new(base, Duration::from_secs(5)).expect("client");

    let job_id = api
        .create_job(request("taper-fade"))
        .await
        .expect("job created");

    assert_eq!(job_id.as_str(), "42");
    assert_eq!(
        fields.lock().expect("fields").clone(),
        vec![
            ("styleId".to_string(), "taper-fade".to_string()),
            ("format".to_string(), "jpg".to_string()),
        ]
    );
}

#[tokio::test]
async fn create_job_keeps_the_job_id_verbatim() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/render");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"jobId":" 42"}"#);
    });

    let job_id = api(&server)
        .create_job(request("mid-fade"))
        .await
        .expect("job created");
    assert_eq!(job_id.as_str(), " 42");
}

#[tokio::test]
async fn create_job_reports_server_errors_by_status() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/api/render");
        then.status(500).body("boom");
    });

    let err = api(&server)
        .create_job(request("mid-fade"))
        .await
        .unwrap_err();

    assert_eq!(err, SubmissionError::Status { status: 500 });
    assert_eq!(err.to_string(), "Render request failed (500).");
    mock.assert();
}

#[tokio::test]
async fn create_job_without_job_id_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/render");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"queued":true}"#);
    });

    let err = api(&server)
        .create_job(request("mid-fade"))
        .await
        .unwrap_err();
    assert_eq!(err, SubmissionError::MissingJobId);
}

#[tokio::test]
async fn create_job_with_non_json_body_is_missing_job_id() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/render");
        then.status(200).body("ok");
    });

    let err = api(&server)
        .create_job(request("mid-fade"))
        .await
        .unwrap_err();
    assert_eq!(err, SubmissionError::MissingJobId);
}

#[tokio::test]
async fn job_status_reads_failed_jobs() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/render/42");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"status":"failed","error":"GPU out of memory"}"#);
    });

    let status = api(&server).job_status(&job("42")).await.expect("status");
    assert_eq!(
        status.state,
        RenderJobState::Failed {
            error: Some("GPU out of memory".to_string())
        }
    );
}

#[tokio::test]
async fn job_status_treats_done_without_url_as_pending() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/render/42");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"status":"done"}"#);
    });

    let status = api(&server).job_status(&job("42")).await.expect("status");
    assert_eq!(status.state, RenderJobState::Pending);
}

#[tokio::test]
async fn job_status_without_a_status_keeps_polling() {
    for body in ["{}", r#"{"status":null}"#] {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/api/render/42");
            then.status(200)
                .header("content-type", "application/json")
                .body(body);
        });

        let status = api(&server).job_status(&job("42")).await.expect("status");
        assert_eq!(status.state, RenderJobState::Pending, "body {body}");
    }
}

#[tokio::test]
async fn job_status_non_success_is_a_poll_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/render/42");
        then.status(404);
    });

    let err = api(&server).job_status(&job("42")).await.unwrap_err();
    assert_eq!(err, PollError::Status { status: 404 });
}

#[tokio::test]
async fn job_status_garbage_body_is_a_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/render/42");
        then.status(200).body("<html>");
    });

    let err = api(&server).job_status(&job("42")).await.unwrap_err();
    assert!(matches!(err, PollError::Decode(_)));
}

#[tokio::test]
async fn fetch_result_resolves_relative_urls() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/renders/42.jpg");
        then.status(200)
            .header("content-type", "image/jpeg")
            .body("jpeg-bytes");
    });

    let bytes = api(&server)
        .fetch_result("/renders/42.jpg")
        .await
        .expect("downloaded");
    assert_eq!(bytes.as_ref(), b"jpeg-bytes");
    mock.assert();
}

#[tokio::test]
async fn fetch_result_failure_is_a_download_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/renders/missing.jpg");
        then.status(404);
    });

    let err = api(&server)
        .fetch_result(&server.url("/renders/missing.jpg"))
        .await
        .unwrap_err();
    assert_eq!(err, DownloadError::Status { status: 404 });
    assert_eq!(err.to_string(), "Could not download finished image.");
}
