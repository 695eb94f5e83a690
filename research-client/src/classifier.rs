//! Event classification
//!
//! Pure mapping from one progress-stream frame to the domain actions the
//! session applies. Missing payload fields never reject a frame of a known
//! type; they fall back to generic status text instead. Frames that cannot be
//! decoded, or whose `type` is unknown, classify as unrecognized and are
//! dropped by the caller.

use crate::error::SessionError;
use crate::models::{FinalizedQuery, PartialQuery, StatusMessage, SubPhase};
use crate::steps::{step_message, step_sub_phase};
use research_common::events::ResearchEvent;

/// State change requested by a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainAction {
    /// Enter (or stay in) Streaming with the given sub-phase
    SetPhase(SubPhase),
    SetStatus(StatusMessage),
    /// Insert or overwrite an in-flight query
    UpsertPartialQuery(PartialQuery),
    /// Move a query to the finalized list
    PromoteQuery(FinalizedQuery),
    /// End the job
    Terminate(Termination),
}

/// How a job ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Complete { report: String },
    /// Backend-reported failure, always a [`SessionError::StreamEvent`]
    Error(SessionError),
}

/// Result of classifying one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Actions to apply, in order
    Recognized(Vec<DomainAction>),
    /// Frame to log and ignore; always a [`SessionError::MalformedFrame`]
    Unrecognized(SessionError),
}

/// Classify one raw frame payload
pub fn classify_frame(data: &str) -> Classification {
    match ResearchEvent::from_frame(data) {
        Ok(ResearchEvent::Unknown) => {
            unrecognized(format!("unrecognized event type \"{}\"", frame_type(data)))
        }
        Ok(event) => classify(&event),
        Err(e) => unrecognized(format!("undecodable frame: {}", e)),
    }
}

/// Raw `type` tag of a frame, empty if there is none
fn frame_type(data: &str) -> String {
    serde_json::from_str::<serde_json::Value>(data)
        .ok()
        .and_then(|value| value.get("type")?.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Classify a decoded event
pub fn classify(event: &ResearchEvent) -> Classification {
    use DomainAction::{SetPhase, SetStatus};

    let actions = match event {
        ResearchEvent::Progress { step } => {
            let Some(step) = non_empty(step) else {
                return unrecognized(format!("{} event without step", event.event_type()));
            };
            vec![
                SetPhase(step_sub_phase(step)),
                SetStatus(StatusMessage::new(step, step_message(step))),
            ]
        }

        ResearchEvent::QueryGenerating {
            category,
            query_number,
            query,
        } => {
            let text = query.as_deref().unwrap_or_default();
            let mut actions = vec![
                SetPhase(SubPhase::Search),
                SetStatus(StatusMessage::new(
                    non_empty(category).unwrap_or("Generating queries"),
                    numbered_query_message(*query_number, text),
                )),
            ];
            if let (Some(category), Some(number), Some(text)) = (category, query_number, query) {
                actions.push(DomainAction::UpsertPartialQuery(PartialQuery {
                    text: text.clone(),
                    number: *number,
                    category: category.clone(),
                    is_complete: false,
                }));
            }
            actions
        }

        ResearchEvent::QueryGenerated {
            category,
            query_number,
            query,
        } => {
            let text = query.as_deref().unwrap_or_default();
            let mut actions = vec![
                SetPhase(SubPhase::Search),
                SetStatus(StatusMessage::new(
                    non_empty(category).unwrap_or("Query generated"),
                    format!("Generated: {}", text),
                )),
            ];
            if let (Some(category), Some(number), Some(text)) = (category, query_number, query) {
                actions.push(DomainAction::PromoteQuery(FinalizedQuery {
                    text: text.clone(),
                    number: *number,
                    category: category.clone(),
                }));
            }
            actions
        }

        ResearchEvent::ResearchInit { company, message } => vec![
            SetPhase(SubPhase::Search),
            SetStatus(StatusMessage::new(
                "Initializing",
                message_or(message, || match non_empty(company) {
                    Some(company) => format!("Initiating research for {}", company),
                    None => "Initiating research".to_string(),
                }),
            )),
        ],

        ResearchEvent::CrawlStart { message } => vec![
            SetPhase(SubPhase::Search),
            SetStatus(StatusMessage::new(
                "Website Crawl",
                message_or(message, || "Crawling company website".to_string()),
            )),
        ],

        ResearchEvent::Curation { category, message } => vec![
            SetPhase(SubPhase::Search),
            SetStatus(StatusMessage::new(
                "Curating data",
                message_or(message, || match non_empty(category) {
                    Some(category) => format!("Curating {} documents", category),
                    None => "Curating documents".to_string(),
                }),
            )),
        ],

        ResearchEvent::Enrichment { message } => vec![
            SetPhase(SubPhase::Enrichment),
            SetStatus(StatusMessage::new(
                "Enriching data",
                message_or(message, || {
                    "Enriching documents with additional content".to_string()
                }),
            )),
        ],

        ResearchEvent::BriefingStart {
            category,
            total_docs,
        } => {
            let mut message = match non_empty(category) {
                Some(category) => format!("Creating {} briefing", category),
                None => "Creating briefing".to_string(),
            };
            if let Some(total) = total_docs {
                message.push_str(&format!(" from {} documents", total));
            }
            vec![
                SetPhase(SubPhase::Briefing),
                SetStatus(StatusMessage::new("Generating briefings", message)),
            ]
        }

        ResearchEvent::BriefingComplete {
            category,
            content_length,
        } => {
            let mut message = match non_empty(category) {
                Some(category) => format!("{} briefing generated", category),
                None => "Briefing generated".to_string(),
            };
            if let Some(length) = content_length {
                message.push_str(&format!(" ({} characters)", length));
            }
            vec![
                SetPhase(SubPhase::Briefing),
                SetStatus(StatusMessage::new("Briefing complete", message)),
            ]
        }

        ResearchEvent::ReportCompilation { message } => vec![
            SetPhase(SubPhase::Briefing),
            SetStatus(StatusMessage::new(
                "Finalizing report",
                message_or(message, || "Compiling final report".to_string()),
            )),
        ],

        ResearchEvent::Complete { report } => {
            // An empty report is not a completion; the backend intent is unknown
            let Some(report) = non_empty(report) else {
                return unrecognized(format!("{} event without report", event.event_type()));
            };
            vec![DomainAction::Terminate(Termination::Complete {
                report: report.to_string(),
            })]
        }

        ResearchEvent::Error { error } => vec![DomainAction::Terminate(Termination::Error(
            SessionError::StreamEvent(non_empty(error).unwrap_or("Research failed").to_string()),
        ))],

        ResearchEvent::Unknown => return unrecognized("unrecognized event type"),
    };

    Classification::Recognized(actions)
}

fn unrecognized(reason: impl Into<String>) -> Classification {
    Classification::Unrecognized(SessionError::MalformedFrame(reason.into()))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn message_or(message: &Option<String>, default: impl FnOnce() -> String) -> String {
    match non_empty(message) {
        Some(message) => message.to_string(),
        None => default(),
    }
}

fn numbered_query_message(number: Option<i64>, text: &str) -> String {
    match number {
        Some(number) => format!("Query {}: {}", number, text),
        None => format!("Query: {}", text),
    }
}
