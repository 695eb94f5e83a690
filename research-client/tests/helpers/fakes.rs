//! In-memory collaborators for driving the session controller

use async_trait::async_trait;
use research_client::error::{SessionError, SessionResult};
use research_client::services::{Clipboard, FrameStream, JobSubmitter, ReportExporter, StreamTransport};
use research_client::SessionServices;
use research_common::api::JobRequest;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Encode a JSON value as a frame payload
pub fn frame(value: Value) -> String {
    value.to_string()
}

/// Job submitter returning scripted outcomes, `job-{n}` when nothing is scripted
#[derive(Default)]
pub struct FakeSubmitter {
    responses: Mutex<VecDeque<(Duration, SessionResult<String>)>>,
    requests: Mutex<Vec<JobRequest>>,
}

impl FakeSubmitter {
    pub fn respond(&self, result: SessionResult<String>) {
        self.respond_after(Duration::ZERO, result);
    }

    /// Script a response delivered after `delay`
    pub fn respond_after(&self, delay: Duration, result: SessionResult<String>) {
        self.responses.lock().unwrap().push_back((delay, result));
    }

    pub fn requests(&self) -> Vec<JobRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobSubmitter for FakeSubmitter {
    async fn create(&self, request: &JobRequest) -> SessionResult<String> {
        let count = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        let scripted = self.responses.lock().unwrap().pop_front();
        match scripted {
            Some((delay, result)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Ok(format!("job-{}", count)),
        }
    }
}

/// Decrements the open-stream counter when a stream is dropped
struct OpenGuard(Arc<AtomicUsize>);

impl OpenGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for OpenGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Stream transport fed by test-owned channels
///
/// Each `open` takes the next queued channel; with none queued the stream
/// stays silent until dropped.
#[derive(Default)]
pub struct FakeTransport {
    queued: Mutex<VecDeque<mpsc::UnboundedReceiver<SessionResult<String>>>>,
    opened: Mutex<Vec<String>>,
    open_streams: Arc<AtomicUsize>,
    fail_open: Mutex<bool>,
}

impl FakeTransport {
    /// Queue a stream for the next `open` and return its feeding end
    pub fn push_stream(&self) -> mpsc::UnboundedSender<SessionResult<String>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.queued.lock().unwrap().push_back(rx);
        tx
    }

    /// Queue a stream preloaded with `frames`, kept open afterwards
    pub fn push_frames(&self, frames: Vec<String>) -> mpsc::UnboundedSender<SessionResult<String>> {
        let tx = self.push_stream();
        for data in frames {
            tx.send(Ok(data)).unwrap();
        }
        tx
    }

    pub fn fail_next_open(&self) {
        *self.fail_open.lock().unwrap() = true;
    }

    /// Streams opened and not yet dropped
    pub fn open_count(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    /// Job ids passed to `open`, in call order
    pub fn opened_jobs(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamTransport for FakeTransport {
    async fn open(&self, job_id: &str) -> SessionResult<FrameStream> {
        self.opened.lock().unwrap().push(job_id.to_string());

        if std::mem::take(&mut *self.fail_open.lock().unwrap()) {
            return Err(SessionError::Transport("connection refused".to_string()));
        }

        let guard = OpenGuard::new(self.open_streams.clone());
        let queued = self.queued.lock().unwrap().pop_front();

        let stream = async_stream::stream! {
            let _guard = guard;
            match queued {
                Some(mut rx) => {
                    while let Some(item) = rx.recv().await {
                        yield item;
                    }
                }
                None => futures::future::pending::<()>().await,
            }
        };
        Ok(Box::pin(stream))
    }
}

/// Exporter returning fixed bytes or a scripted failure
pub struct FakeExporter {
    result: Mutex<SessionResult<Vec<u8>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl Default for FakeExporter {
    fn default() -> Self {
        Self {
            result: Mutex::new(Ok(b"%PDF-1.4 fake".to_vec())),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeExporter {
    pub fn fail_with(&self, message: &str) {
        *self.result.lock().unwrap() = Err(SessionError::Export(message.to_string()));
    }

    /// `(report, company_name)` of every render call
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportExporter for FakeExporter {
    async fn render_pdf(&self, report: &str, company_name: &str) -> SessionResult<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((report.to_string(), company_name.to_string()));
        self.result.lock().unwrap().clone()
    }
}

/// Clipboard recording copied text
#[derive(Default)]
pub struct FakeClipboard {
    texts: Mutex<Vec<String>>,
    fail: Mutex<bool>,
}

impl FakeClipboard {
    pub fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clipboard for FakeClipboard {
    async fn write_text(&self, text: &str) -> SessionResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(SessionError::Clipboard("Failed to copy to clipboard".to_string()));
        }
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// One set of fakes wired into [`SessionServices`]
#[derive(Clone, Default)]
pub struct Fakes {
    pub submitter: Arc<FakeSubmitter>,
    pub transport: Arc<FakeTransport>,
    pub exporter: Arc<FakeExporter>,
    pub clipboard: Arc<FakeClipboard>,
}

impl Fakes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn services(&self) -> SessionServices {
        SessionServices {
            submitter: self.submitter.clone(),
            transport: self.transport.clone(),
            exporter: self.exporter.clone(),
            clipboard: self.clipboard.clone(),
        }
    }
}
