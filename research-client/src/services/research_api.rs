//! Research backend HTTP client
//!
//! - `POST {base}/research` → job identifier
//! - `GET {base}/research/{job_id}/stream` → `text/event-stream` of JSON frames
//! - `POST {base}/generate-pdf` → PDF bytes

use super::{FrameStream, JobSubmitter, ReportExporter, StreamTransport};
use crate::error::{SessionError, SessionResult};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use research_common::api::{JobCreated, JobRequest, PdfRequest};
use research_common::config::ClientConfig;
use research_common::sse::SseDecoder;
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("research-client/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Research API client
///
/// One-shot requests use `request_timeout`; the progress stream only has a
/// connect timeout since it stays open for the whole job.
#[derive(Debug, Clone)]
pub struct ResearchApiClient {
    http_client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl ResearchApiClient {
    /// `base_url` must not end with a slash
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> reqwest::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            request_timeout,
        })
    }

    pub fn from_config(config: &ClientConfig) -> reqwest::Result<Self> {
        Self::new(config.api_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn research_url(&self) -> String {
        format!("{}/research", self.base_url)
    }

    fn stream_url(&self, job_id: &str) -> String {
        format!("{}/research/{}/stream", self.base_url, job_id)
    }

    fn pdf_url(&self) -> String {
        format!("{}/generate-pdf", self.base_url)
    }
}

#[async_trait]
impl JobSubmitter for ResearchApiClient {
    async fn create(&self, request: &JobRequest) -> SessionResult<String> {
        debug!(company = %request.company, "Creating research job");

        let response = self
            .http_client
            .post(self.research_url())
            .timeout(self.request_timeout)
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| SessionError::Submission(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Job creation rejected");
            return Err(SessionError::Submission(format!(
                "HTTP error! status: {}",
                status.as_u16()
            )));
        }

        let created: JobCreated = response
            .json()
            .await
            .map_err(|e| SessionError::Submission(format!("Invalid job response: {}", e)))?;

        match created.job_id.filter(|id| !id.trim().is_empty()) {
            Some(job_id) => {
                info!(job_id = %job_id, "Research job created");
                Ok(job_id)
            }
            None => Err(SessionError::Submission("No job ID received".to_string())),
        }
    }
}

#[async_trait]
impl StreamTransport for ResearchApiClient {
    async fn open(&self, job_id: &str) -> SessionResult<FrameStream> {
        let url = self.stream_url(job_id);
        debug!(job_id, url = %url, "Opening progress stream");

        let response = self
            .http_client
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Transport(format!(
                "Stream request failed: HTTP {}",
                status.as_u16()
            )));
        }

        let job_id = job_id.to_string();
        let mut body = Box::pin(response.bytes_stream());

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => {
                        for frame in decoder.feed(&bytes) {
                            if frame.is_message() {
                                yield Ok(frame.data);
                            } else {
                                debug!(job_id = %job_id, event = ?frame.event, "Skipping named SSE event");
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(SessionError::Transport(e.to_string()));
                        break;
                    }
                }
            }

            debug!(job_id = %job_id, "Progress stream body ended");
        };

        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl ReportExporter for ResearchApiClient {
    async fn render_pdf(&self, report: &str, company_name: &str) -> SessionResult<Vec<u8>> {
        let body = PdfRequest {
            report_content: report.to_string(),
            company_name: company_name.to_string(),
        };

        let response = self
            .http_client
            .post(self.pdf_url())
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("PDF request failed: {}", e);
                SessionError::Export("Failed to generate PDF".to_string())
            })?;

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "PDF generation rejected");
            return Err(SessionError::Export("Failed to generate PDF".to_string()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SessionError::Export(format!("Failed to read PDF: {}", e)))?;

        Ok(bytes.to_vec())
    }
}
