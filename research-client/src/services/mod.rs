//! External collaborators of the session controller
//!
//! The controller only talks to these traits. [`ResearchApiClient`] implements
//! the three HTTP-backed ones against the research backend; [`SystemClipboard`]
//! pipes text into the platform clipboard tool.

pub mod clipboard;
pub mod research_api;

pub use clipboard::SystemClipboard;
pub use research_api::ResearchApiClient;

use crate::error::SessionResult;
use async_trait::async_trait;
use futures::stream::Stream;
use research_common::api::JobRequest;
use std::pin::Pin;

/// Frames of one open progress stream
///
/// Yields raw `data` payloads in delivery order, or a single transport error
/// after which the stream ends. Dropping the stream closes the connection.
pub type FrameStream = Pin<Box<dyn Stream<Item = SessionResult<String>> + Send>>;

/// Creates research jobs
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    /// Create a job and return its identifier
    ///
    /// Fails with [`crate::SessionError::Submission`].
    async fn create(&self, request: &JobRequest) -> SessionResult<String>;
}

/// Opens progress streams
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open the progress stream of a job
    ///
    /// Fails with [`crate::SessionError::Transport`].
    async fn open(&self, job_id: &str) -> SessionResult<FrameStream>;
}

/// Renders reports as PDF documents
#[async_trait]
pub trait ReportExporter: Send + Sync {
    /// Fails with [`crate::SessionError::Export`].
    async fn render_pdf(&self, report: &str, company_name: &str) -> SessionResult<Vec<u8>>;
}

/// Writes text to the user's clipboard
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Fails with [`crate::SessionError::Clipboard`].
    async fn write_text(&self, text: &str) -> SessionResult<()>;
}
