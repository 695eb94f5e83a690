//! Research API client integration tests
//!
//! Run the HTTP collaborators against an in-process axum backend.

mod helpers;

use futures::StreamExt;
use helpers::{frame, FakeClipboard, ServerScript, TestServer};
use research_client::error::{SessionError, CONNECTION_LOST_MESSAGE};
use research_client::models::Phase;
use research_client::services::{JobSubmitter, ReportExporter, ResearchApiClient, StreamTransport};
use research_client::{SessionController, SessionRuntime, SessionServices, SessionSettings};
use research_common::api::JobRequest;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn client(server: &TestServer) -> ResearchApiClient {
    ResearchApiClient::new(server.base_url.clone(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_create_job_posts_normalized_request() {
    let server = TestServer::start(ServerScript::default()).await;

    let job_id = client(&server)
        .create(&JobRequest::new("Acme", "acme.com", "", "  "))
        .await
        .unwrap();

    assert_eq!(job_id, "job-42");
    assert_eq!(
        server.script().job_requests,
        vec![json!({ "company": "Acme", "company_url": "https://acme.com" })]
    );
}

#[tokio::test]
async fn test_create_job_http_error() {
    let server = TestServer::start(ServerScript {
        create_status: 500,
        ..ServerScript::default()
    })
    .await;

    let result = client(&server).create(&JobRequest::new("Acme", "", "", "")).await;

    assert_eq!(
        result,
        Err(SessionError::Submission("HTTP error! status: 500".to_string()))
    );
}

#[tokio::test]
async fn test_create_job_without_id() {
    let server = TestServer::start(ServerScript {
        job_id: None,
        ..ServerScript::default()
    })
    .await;

    let result = client(&server).create(&JobRequest::new("Acme", "", "", "")).await;

    assert_eq!(
        result,
        Err(SessionError::Submission("No job ID received".to_string()))
    );
}

#[tokio::test]
async fn test_create_job_unreachable_backend() {
    // Grab a free port, then close it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ResearchApiClient::new(format!("http://{}", addr), Duration::from_secs(5)).unwrap();
    let result = client.create(&JobRequest::new("Acme", "", "", "")).await;

    assert!(matches!(result, Err(SessionError::Submission(_))));
}

#[tokio::test]
async fn test_stream_yields_message_frames_in_order() {
    let server = TestServer::start(ServerScript {
        frames: vec![
            frame(json!({ "type": "progress", "step": "grounding" })),
            frame(json!({ "type": "complete", "report": "R" })),
        ],
        ..ServerScript::default()
    })
    .await;

    let stream = client(&server).open("job-42").await.unwrap();
    let frames: Vec<_> = stream.collect().await;

    assert_eq!(
        frames,
        vec![
            Ok(frame(json!({ "type": "progress", "step": "grounding" }))),
            Ok(frame(json!({ "type": "complete", "report": "R" }))),
        ]
    );
    assert_eq!(server.script().streamed_jobs, vec!["job-42".to_string()]);
}

#[tokio::test]
async fn test_render_pdf_returns_document() {
    let server = TestServer::start(ServerScript::default()).await;

    let bytes = client(&server).render_pdf("# Report", "Acme").await.unwrap();

    assert_eq!(bytes, b"%PDF-1.4 test");
    assert_eq!(
        server.script().pdf_requests,
        vec![json!({ "report_content": "# Report", "company_name": "Acme" })]
    );
}

#[tokio::test]
async fn test_render_pdf_failure() {
    let server = TestServer::start(ServerScript {
        pdf: None,
        ..ServerScript::default()
    })
    .await;

    let result = client(&server).render_pdf("# Report", "Acme").await;

    assert_eq!(
        result,
        Err(SessionError::Export("Failed to generate PDF".to_string()))
    );
}

fn runtime_for(server: &TestServer, dir: &TempDir) -> (research_client::SessionHandle, tokio::task::JoinHandle<()>) {
    let services =
        SessionServices::from_api_client(client(server), Arc::new(FakeClipboard::default()));
    let settings = SessionSettings {
        settle_delay: Duration::ZERO,
        copied_flag_duration: Duration::from_millis(100),
        download_dir: dir.path().join("reports"),
    };
    SessionRuntime::spawn(SessionController::new(services, settings))
}

#[tokio::test]
async fn test_end_to_end_job_and_export() {
    let server = TestServer::start(ServerScript {
        frames: vec![
            frame(json!({ "type": "research_init", "company": "Acme" })),
            frame(json!({ "type": "progress", "step": "enricher" })),
            frame(json!({ "type": "report_compilation" })),
            frame(json!({ "type": "complete", "report": "# Acme report" })),
        ],
        ..ServerScript::default()
    })
    .await;
    let dir = TempDir::new().unwrap();
    let (handle, _task) = runtime_for(&server, &dir);

    handle
        .submit(JobRequest::new("Acme", "https://acme.com", "", ""))
        .await
        .unwrap();
    let state = tokio::time::timeout(Duration::from_secs(5), handle.wait_for(|s| s.phase.is_terminal()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(state.phase, Phase::Complete);
    assert_eq!(state.report.as_deref(), Some("# Acme report"));
    assert_eq!(state.job_id.as_deref(), Some("job-42"));

    let path = handle.export_report().await.unwrap().unwrap();
    assert_eq!(path, dir.path().join("reports").join("Acme.pdf"));
    assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.4 test");
}

#[tokio::test]
async fn test_end_to_end_stream_closed_early() {
    let server = TestServer::start(ServerScript {
        frames: vec![frame(json!({ "type": "crawl_start" }))],
        ..ServerScript::default()
    })
    .await;
    let dir = TempDir::new().unwrap();
    let (handle, _task) = runtime_for(&server, &dir);

    handle
        .submit(JobRequest::new("Acme", "", "", ""))
        .await
        .unwrap();
    let state = tokio::time::timeout(Duration::from_secs(5), handle.wait_for(|s| s.phase.is_terminal()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(state.phase, Phase::Error);
    assert_eq!(state.error_message.as_deref(), Some(CONNECTION_LOST_MESSAGE));
}

#[tokio::test]
async fn test_end_to_end_submission_rejected() {
    let server = TestServer::start(ServerScript {
        create_status: 503,
        ..ServerScript::default()
    })
    .await;
    let dir = TempDir::new().unwrap();
    let (handle, _task) = runtime_for(&server, &dir);

    handle
        .submit(JobRequest::new("Acme", "", "", ""))
        .await
        .unwrap();
    let state = tokio::time::timeout(Duration::from_secs(5), handle.wait_for(|s| s.phase.is_terminal()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(state.error_message.as_deref(), Some("HTTP error! status: 503"));
    assert!(server.script().streamed_jobs.is_empty());
}
