//! Event types for the research progress stream
//!
//! Each frame of `GET /research/{job_id}/stream` carries one JSON object tagged
//! by its `type` field. Every payload field is optional: the backend is not
//! trusted to send them all, and consumers fall back to generic text instead
//! of rejecting the frame.

use serde::Deserialize;

/// Research progress events
///
/// Unknown `type` values decode to [`ResearchEvent::Unknown`] so a newer
/// backend never breaks frame decoding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResearchEvent {
    /// A pipeline node started working
    Progress {
        /// Node name, e.g. "financial_analyst"
        step: Option<String>,
    },

    /// A sub-query is being generated; `query` holds the text so far
    QueryGenerating {
        category: Option<String>,
        query_number: Option<i64>,
        query: Option<String>,
    },

    /// A sub-query finished generating
    QueryGenerated {
        category: Option<String>,
        query_number: Option<i64>,
        query: Option<String>,
    },

    ResearchInit {
        company: Option<String>,
        message: Option<String>,
    },

    CrawlStart {
        message: Option<String>,
    },

    Curation {
        category: Option<String>,
        message: Option<String>,
    },

    Enrichment {
        message: Option<String>,
    },

    BriefingStart {
        category: Option<String>,
        total_docs: Option<u64>,
    },

    BriefingComplete {
        category: Option<String>,
        content_length: Option<u64>,
    },

    ReportCompilation {
        message: Option<String>,
    },

    /// Research finished; `report` is the final markdown report
    Complete {
        report: Option<String>,
    },

    /// Research failed on the backend
    Error {
        error: Option<String>,
    },

    /// Any `type` this client does not know
    #[serde(other)]
    Unknown,
}

impl ResearchEvent {
    /// Wire name of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            ResearchEvent::Progress { .. } => "progress",
            ResearchEvent::QueryGenerating { .. } => "query_generating",
            ResearchEvent::QueryGenerated { .. } => "query_generated",
            ResearchEvent::ResearchInit { .. } => "research_init",
            ResearchEvent::CrawlStart { .. } => "crawl_start",
            ResearchEvent::Curation { .. } => "curation",
            ResearchEvent::Enrichment { .. } => "enrichment",
            ResearchEvent::BriefingStart { .. } => "briefing_start",
            ResearchEvent::BriefingComplete { .. } => "briefing_complete",
            ResearchEvent::ReportCompilation { .. } => "report_compilation",
            ResearchEvent::Complete { .. } => "complete",
            ResearchEvent::Error { .. } => "error",
            ResearchEvent::Unknown => "unknown",
        }
    }

    /// Decode one stream frame
    pub fn from_frame(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}
