//! Session controller
//!
//! Orchestrates one job at a time: submit → open stream → apply classified
//! frames → terminate → reset. At most one progress stream is open; it is
//! dropped (closed) before a new one is opened, on reset, and in the same call
//! that applies a terminal action, so a finished job can never be mutated by
//! its own stream again.

use crate::classifier::{classify_frame, Classification, DomainAction, Termination};
use crate::error::{SessionError, SessionResult, CONNECTION_LOST_MESSAGE};
use crate::models::{JobContext, Phase, SessionState};
use crate::phase_machine::{PhaseStateMachine, Transition};
use crate::query_tracker::QueryTracker;
use crate::services::{
    Clipboard, FrameStream, JobSubmitter, ReportExporter, ResearchApiClient, StreamTransport,
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use research_common::api::JobRequest;
use research_common::config::ClientConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Collaborators used by the controller
#[derive(Clone)]
pub struct SessionServices {
    pub submitter: Arc<dyn JobSubmitter>,
    pub transport: Arc<dyn StreamTransport>,
    pub exporter: Arc<dyn ReportExporter>,
    pub clipboard: Arc<dyn Clipboard>,
}

impl SessionServices {
    /// Back every HTTP collaborator with one API client
    pub fn from_api_client(client: ResearchApiClient, clipboard: Arc<dyn Clipboard>) -> Self {
        let client = Arc::new(client);
        Self {
            submitter: client.clone(),
            transport: client.clone(),
            exporter: client,
            clipboard,
        }
    }
}

/// Controller timing and output settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Pause after the internal reset when resubmitting from Complete
    pub settle_delay: Duration,
    /// How long `copied` stays raised after a clipboard copy
    pub copied_flag_duration: Duration,
    /// Where exported PDFs are written
    pub download_dir: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for SessionSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            settle_delay: config.settle_delay,
            copied_flag_duration: config.copied_flag_duration,
            download_dir: config.download_dir.clone(),
        }
    }
}

/// Owner of the research session state
pub struct SessionController {
    services: SessionServices,
    settings: SessionSettings,
    machine: PhaseStateMachine,
    tracker: QueryTracker,
    job_context: JobContext,
    job_id: Option<String>,
    /// Local id of the current submission, for log correlation
    session_id: Option<Uuid>,
    /// The single open progress stream
    stream: Option<FrameStream>,
    action_error: Option<String>,
    exporting: bool,
    copied_until: Option<Instant>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    state_tx: watch::Sender<SessionState>,
}

impl SessionController {
    pub fn new(services: SessionServices, settings: SessionSettings) -> Self {
        let (state_tx, _) = watch::channel(SessionState::default());
        Self {
            services,
            settings,
            machine: PhaseStateMachine::new(),
            tracker: QueryTracker::new(),
            job_context: JobContext::default(),
            job_id: None,
            session_id: None,
            stream: None,
            action_error: None,
            exporting: false,
            copied_until: None,
            started_at: None,
            finished_at: None,
            state_tx,
        }
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Current state
    pub fn snapshot(&self) -> SessionState {
        SessionState {
            phase: self.machine.phase(),
            sub_phase: self.machine.sub_phase(),
            status_message: self.machine.status().cloned(),
            report: self.machine.report().map(str::to_string),
            error_message: self.machine.error_message().map(str::to_string),
            queries: self.tracker.finalized().to_vec(),
            streaming_queries: self.tracker.partial().clone(),
            job_context: self.job_context.clone(),
            job_id: self.job_id.clone(),
            action_error: self.action_error.clone(),
            exporting: self.exporting,
            copied: self.copied_until.is_some(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn has_open_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Start a new job
    ///
    /// Legal from any phase. Resubmitting from Complete first clears the old
    /// job and waits out the settle delay. Any open stream is closed before
    /// the job is created. On return the new stream is open, or the session
    /// is in Error with the failure reason.
    pub async fn submit(&mut self, request: JobRequest) {
        self.action_error = None;

        if self.machine.phase() == Phase::Complete {
            self.close_transport("resubmission");
            self.clear_job();
            let transition = self.machine.begin_reset();
            self.log_transition(&transition);
            self.publish();

            if !self.settings.settle_delay.is_zero() {
                debug!(delay_ms = self.settings.settle_delay.as_millis() as u64, "Waiting before resubmission");
                tokio::time::sleep(self.settings.settle_delay).await;
            }
        }

        self.close_transport("new submission");
        self.clear_job();

        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        self.job_context = JobContext {
            original_company_name: request.company.clone(),
        };
        self.started_at = Some(Utc::now());
        let transition = self.machine.submit();
        self.log_transition(&transition);
        info!(%session_id, company = %request.company, "Submitting research job");
        self.publish();

        let job_id = match self.services.submitter.create(&request).await {
            Ok(job_id) => job_id,
            Err(err) => {
                self.fail(err);
                return;
            }
        };
        self.job_id = Some(job_id.clone());
        self.publish();

        match self.services.transport.open(&job_id).await {
            Ok(stream) => {
                info!(%session_id, job_id = %job_id, "Progress stream opened");
                self.stream = Some(stream);
            }
            Err(err) => {
                warn!(%session_id, job_id = %job_id, "Could not open progress stream: {}", err);
                self.fail(SessionError::Transport(CONNECTION_LOST_MESSAGE.to_string()));
            }
        }
    }

    /// Await and apply the next frame of the open stream
    ///
    /// Returns false when no stream is open. Cancel-safe: dropping the future
    /// before a frame arrives loses nothing.
    pub async fn next_frame(&mut self) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };

        match stream.next().await {
            Some(Ok(frame)) => self.handle_frame(&frame),
            Some(Err(err)) => self.handle_transport_error(err),
            None => self.handle_transport_error(SessionError::Transport(
                "stream ended without a terminal event".to_string(),
            )),
        }
        true
    }

    /// Apply frames until the stream is closed
    pub async fn drain_stream(&mut self) {
        while self.next_frame().await {}
    }

    /// Classify and apply one frame payload
    ///
    /// Frames arriving outside Submitting/Streaming are dropped. Unrecognized
    /// frames are logged and change nothing.
    pub fn handle_frame(&mut self, data: &str) {
        debug!(job_id = ?self.job_id, frame = data, "Stream frame");

        if !self.machine.is_active() {
            debug!(phase = self.machine.phase().as_str(), "Dropping frame outside active phase");
            return;
        }

        match classify_frame(data) {
            Classification::Unrecognized(err) => {
                warn!(job_id = ?self.job_id, "Ignoring frame: {}", err);
            }
            Classification::Recognized(actions) => {
                for action in &actions {
                    if !self.machine.is_active() {
                        break;
                    }
                    self.apply(action);
                }
                self.publish();
            }
        }
    }

    /// The stream failed or closed early: fatal for the active job
    pub fn handle_transport_error(&mut self, err: SessionError) {
        warn!(job_id = ?self.job_id, "Progress stream failed: {}", err);
        if self.machine.is_active() {
            self.fail(SessionError::Transport(CONNECTION_LOST_MESSAGE.to_string()));
        } else {
            self.close_transport("transport error");
            self.publish();
        }
    }

    /// Clear all job state, close the stream and return to Idle
    pub fn reset(&mut self) {
        self.close_transport("reset");
        self.clear_job();
        self.action_error = None;
        let transition = self.machine.reset();
        self.log_transition(&transition);
        self.publish();
    }

    /// Close the stream at teardown
    pub fn dispose(&mut self) {
        self.close_transport("dispose");
        info!("Session controller disposed");
    }

    /// Export the report as `{company or "research_report"}.pdf`
    ///
    /// No-op without a report or while an export is running. Failures land in
    /// `action_error` and leave the phase alone.
    pub async fn export_report(&mut self) -> Option<PathBuf> {
        let Some(report) = self.machine.report().map(str::to_string) else {
            debug!("No report to export");
            return None;
        };
        if self.exporting {
            debug!("Export already running");
            return None;
        }

        self.exporting = true;
        self.publish();

        let company = self.job_context.original_company_name.clone();
        let result = save_report(&self.services, &self.settings, &report, &company).await;
        self.exporting = false;

        let path = match result {
            Ok(path) => {
                info!(path = %path.display(), "Report exported");
                Some(path)
            }
            Err(err) => {
                warn!("Report export failed: {}", err);
                self.action_error = Some(err.to_string());
                None
            }
        };
        self.publish();
        path
    }

    /// Copy the report to the clipboard
    ///
    /// Raises `copied` until [`Self::copied_deadline`]. Failures land in
    /// `action_error` and leave the phase alone.
    pub async fn copy_report(&mut self) -> bool {
        let Some(report) = self.machine.report().map(str::to_string) else {
            debug!("No report to copy");
            return false;
        };

        let copied = match self.services.clipboard.write_text(&report).await {
            Ok(()) => {
                self.copied_until = Some(Instant::now() + self.settings.copied_flag_duration);
                true
            }
            Err(err) => {
                warn!("Clipboard copy failed: {}", err);
                self.action_error = Some(err.to_string());
                false
            }
        };
        self.publish();
        copied
    }

    /// When the `copied` flag should drop
    pub fn copied_deadline(&self) -> Option<Instant> {
        self.copied_until
    }

    pub fn clear_copied(&mut self) {
        if self.copied_until.take().is_some() {
            self.publish();
        }
    }

    fn apply(&mut self, action: &DomainAction) {
        match action {
            DomainAction::UpsertPartialQuery(query) => {
                self.tracker
                    .upsert_partial(&query.category, query.number, &query.text);
            }
            DomainAction::PromoteQuery(query) => {
                if self
                    .tracker
                    .promote(&query.category, query.number, &query.text)
                {
                    info!(
                        category = %query.category,
                        query_number = query.number,
                        "Query finalized: {}",
                        query.text
                    );
                }
            }
            DomainAction::Terminate(termination) => {
                if let Some(transition) = self.machine.apply(action) {
                    self.close_transport("job finished");
                    self.finished_at = Some(Utc::now());
                    self.log_transition(&transition);
                    match termination {
                        Termination::Complete { report } => {
                            info!(job_id = ?self.job_id, report_chars = report.len(), "Research complete")
                        }
                        Termination::Error(err) => {
                            warn!(job_id = ?self.job_id, "Backend reported failure: {}", err)
                        }
                    }
                }
            }
            DomainAction::SetPhase(_) | DomainAction::SetStatus(_) => {
                if let Some(transition) = self.machine.apply(action) {
                    self.log_transition(&transition);
                }
            }
        }
    }

    /// Move the active job to Error
    ///
    /// Contained errors leave the job and its stream alone.
    fn fail(&mut self, err: SessionError) {
        if !err.moves_to_error_phase() {
            warn!(job_id = ?self.job_id, "Ignoring contained error: {}", err);
            return;
        }
        warn!(job_id = ?self.job_id, "Research job failed: {}", err);
        self.close_transport("job failed");
        if let Some(transition) = self.machine.fail(&err) {
            self.finished_at = Some(Utc::now());
            self.log_transition(&transition);
        }
        self.publish();
    }

    fn clear_job(&mut self) {
        self.tracker.reset();
        self.job_context = JobContext::default();
        self.job_id = None;
        self.session_id = None;
        self.exporting = false;
        self.copied_until = None;
        self.started_at = None;
        self.finished_at = None;
    }

    fn close_transport(&mut self, reason: &str) {
        if self.stream.take().is_some() {
            debug!(job_id = ?self.job_id, reason, "Progress stream closed");
        }
    }

    fn log_transition(&self, transition: &Transition) {
        info!(
            job_id = ?self.job_id,
            from = transition.old_phase.as_str(),
            to = transition.new_phase.as_str(),
            "Session phase changed"
        );
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.snapshot());
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.close_transport("controller dropped");
    }
}

/// Render the report and write it into the download directory
async fn save_report(
    services: &SessionServices,
    settings: &SessionSettings,
    report: &str,
    company: &str,
) -> SessionResult<PathBuf> {
    let bytes = services.exporter.render_pdf(report, company).await?;

    let dir = &settings.download_dir;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| SessionError::Export(format!("Failed to save PDF: {}", e)))?;

    let path = dir.join(pdf_file_name(company));
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| SessionError::Export(format!("Failed to save PDF: {}", e)))?;
    Ok(path)
}

/// File name for an exported report
///
/// Path separators in the company name are replaced so the file always lands
/// in the download directory.
pub fn pdf_file_name(company: &str) -> String {
    let name = company.trim();
    let name = if name.is_empty() { "research_report" } else { name };
    let safe: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    format!("{}.pdf", safe)
}
