//! Observable session state
//!
//! [`SessionState`] is the snapshot published by the session controller after
//! every mutation. It is a plain value: presentation code clones it out of the
//! watch channel and renders it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coarse lifecycle stage of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No job
    Idle,
    /// Job creation requested, no stream event applied yet
    Submitting,
    /// Progress events are being applied
    Streaming,
    /// Report received (terminal)
    Complete,
    /// Job failed (terminal)
    Error,
    /// Previous job cleared, waiting out the settle delay before resubmitting
    Resetting,
}

impl Phase {
    /// Complete or Error
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Complete | Phase::Error)
    }

    /// Submitting or Streaming: stream events are accepted
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Submitting | Phase::Streaming)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Submitting => "submitting",
            Phase::Streaming => "streaming",
            Phase::Complete => "complete",
            Phase::Error => "error",
            Phase::Resetting => "resetting",
        }
    }
}

/// Backend pipeline stage active while streaming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubPhase {
    Search,
    Enrichment,
    Briefing,
}

impl SubPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SubPhase::Search => "search",
            SubPhase::Enrichment => "enrichment",
            SubPhase::Briefing => "briefing",
        }
    }
}

/// Last human-readable status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub step: String,
    pub message: String,
}

impl StatusMessage {
    pub fn new(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            message: message.into(),
        }
    }
}

/// Stable identity of a research sub-query
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey {
    pub category: String,
    pub number: i64,
}

impl QueryKey {
    pub fn new(category: impl Into<String>, number: i64) -> Self {
        Self {
            category: category.into(),
            number,
        }
    }
}

/// A sub-query whose generation finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedQuery {
    pub text: String,
    pub number: i64,
    pub category: String,
}

impl FinalizedQuery {
    pub fn key(&self) -> QueryKey {
        QueryKey::new(self.category.clone(), self.number)
    }
}

/// A sub-query still being generated; overwritten by every partial event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialQuery {
    pub text: String,
    pub number: i64,
    pub category: String,
    pub is_complete: bool,
}

/// Job details kept for later use (export file naming)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobContext {
    pub original_company_name: String,
}

/// Snapshot of one research session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub phase: Phase,
    /// Set only while `phase` is Streaming
    pub sub_phase: Option<SubPhase>,
    pub status_message: Option<StatusMessage>,
    /// Set only while `phase` is Complete
    pub report: Option<String>,
    /// Set only while `phase` is Error
    pub error_message: Option<String>,
    /// Finalized queries in completion order
    pub queries: Vec<FinalizedQuery>,
    /// In-flight queries
    pub streaming_queries: BTreeMap<QueryKey, PartialQuery>,
    pub job_context: JobContext,
    /// Backend job identifier once job creation succeeded
    pub job_id: Option<String>,
    /// Failure of an export or clipboard call; never changes `phase`
    pub action_error: Option<String>,
    /// PDF export in progress
    pub exporting: bool,
    /// Report was copied to the clipboard recently
    pub copied: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            sub_phase: None,
            status_message: None,
            report: None,
            error_message: None,
            queries: Vec::new(),
            streaming_queries: BTreeMap::new(),
            job_context: JobContext::default(),
            job_id: None,
            action_error: None,
            exporting: false,
            copied: false,
            started_at: None,
            finished_at: None,
        }
    }
}

impl SessionState {
    /// Whether any query, partial or finalized, is known
    pub fn has_queries(&self) -> bool {
        !self.queries.is_empty() || !self.streaming_queries.is_empty()
    }
}
