//! In-process research backend on an ephemeral port

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Backend behavior and recorded requests
#[derive(Debug, Clone)]
pub struct ServerScript {
    /// Status for `POST /research`
    pub create_status: u16,
    /// `job_id` in the creation response; omitted when `None`
    pub job_id: Option<String>,
    /// `data` payloads sent on the progress stream, then the stream ends
    pub frames: Vec<String>,
    /// Response body of `/generate-pdf`; `None` answers 500
    pub pdf: Option<Vec<u8>>,
    pub job_requests: Vec<Value>,
    pub pdf_requests: Vec<Value>,
    pub streamed_jobs: Vec<String>,
}

impl Default for ServerScript {
    fn default() -> Self {
        Self {
            create_status: 200,
            job_id: Some("job-42".to_string()),
            frames: Vec::new(),
            pdf: Some(b"%PDF-1.4 test".to_vec()),
            job_requests: Vec::new(),
            pdf_requests: Vec::new(),
            streamed_jobs: Vec::new(),
        }
    }
}

type Shared = Arc<Mutex<ServerScript>>;

pub struct TestServer {
    pub base_url: String,
    script: Shared,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(script: ServerScript) -> Self {
        let script = Arc::new(Mutex::new(script));
        let app = Router::new()
            .route("/research", post(create_job))
            .route("/research/:job_id/stream", get(stream_job))
            .route("/generate-pdf", post(generate_pdf))
            .with_state(script.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            script,
            task,
        }
    }

    /// Copy of the script including recorded requests
    pub fn script(&self) -> ServerScript {
        self.script.lock().unwrap().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn create_job(State(script): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut script = script.lock().unwrap();
    script.job_requests.push(body);

    let status = StatusCode::from_u16(script.create_status).unwrap();
    if !status.is_success() {
        return (status, Json(json!({ "detail": "rejected" }))).into_response();
    }

    match &script.job_id {
        Some(job_id) => Json(json!({ "job_id": job_id, "status": "accepted" })).into_response(),
        None => Json(json!({ "status": "accepted" })).into_response(),
    }
}

async fn stream_job(State(script): State<Shared>, Path(job_id): Path<String>) -> impl IntoResponse {
    let frames = {
        let mut script = script.lock().unwrap();
        script.streamed_jobs.push(job_id);
        script.frames.clone()
    };

    // A named event first; the client only consumes unnamed messages
    let mut events = vec![Event::default().event("ping").data("keep-alive")];
    events.extend(frames.into_iter().map(|data| Event::default().data(data)));

    Sse::new(stream::iter(events.into_iter().map(Ok::<_, Infallible>)))
}

async fn generate_pdf(State(script): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut script = script.lock().unwrap();
    script.pdf_requests.push(body);

    match &script.pdf {
        Some(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/pdf")],
            bytes.clone(),
        )
            .into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
