//! Research pipeline step names
//!
//! `progress` events name the backend node that started working. The table
//! below maps each known node to the sub-phase it belongs to and the text
//! shown to the user. Unknown names never fail: they fall back to the Search
//! sub-phase and a generic "Processing {step}..." message.

use crate::models::SubPhase;

/// Known backend pipeline nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResearchStep {
    Grounding,
    FinancialAnalyst,
    NewsScanner,
    IndustryAnalyst,
    CompanyAnalyst,
    Collector,
    Curator,
    Enricher,
    Briefing,
    Editor,
}

impl ResearchStep {
    pub const ALL: [ResearchStep; 10] = [
        ResearchStep::Grounding,
        ResearchStep::FinancialAnalyst,
        ResearchStep::NewsScanner,
        ResearchStep::IndustryAnalyst,
        ResearchStep::CompanyAnalyst,
        ResearchStep::Collector,
        ResearchStep::Curator,
        ResearchStep::Enricher,
        ResearchStep::Briefing,
        ResearchStep::Editor,
    ];

    /// Look up a step by its wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.name() == name)
    }

    /// Wire name
    pub fn name(self) -> &'static str {
        match self {
            ResearchStep::Grounding => "grounding",
            ResearchStep::FinancialAnalyst => "financial_analyst",
            ResearchStep::NewsScanner => "news_scanner",
            ResearchStep::IndustryAnalyst => "industry_analyst",
            ResearchStep::CompanyAnalyst => "company_analyst",
            ResearchStep::Collector => "collector",
            ResearchStep::Curator => "curator",
            ResearchStep::Enricher => "enricher",
            ResearchStep::Briefing => "briefing",
            ResearchStep::Editor => "editor",
        }
    }

    pub fn sub_phase(self) -> SubPhase {
        match self {
            ResearchStep::Enricher => SubPhase::Enrichment,
            ResearchStep::Briefing | ResearchStep::Editor => SubPhase::Briefing,
            _ => SubPhase::Search,
        }
    }

    /// User-facing description
    pub fn description(self) -> &'static str {
        match self {
            ResearchStep::Grounding => "Analyzing company information",
            ResearchStep::FinancialAnalyst => "Researching financial data",
            ResearchStep::NewsScanner => "Scanning latest news",
            ResearchStep::IndustryAnalyst => "Analyzing industry trends",
            ResearchStep::CompanyAnalyst => "Researching company details",
            ResearchStep::Collector => "Collecting research data",
            ResearchStep::Curator => "Curating relevant information",
            ResearchStep::Enricher => "Enriching data with context",
            ResearchStep::Briefing => "Generating briefings",
            ResearchStep::Editor => "Finalizing report",
        }
    }
}

/// Sub-phase for a step name (Search when unknown)
pub fn step_sub_phase(name: &str) -> SubPhase {
    ResearchStep::from_name(name)
        .map(ResearchStep::sub_phase)
        .unwrap_or(SubPhase::Search)
}

/// Status text for a step name ("Processing {name}..." when unknown)
pub fn step_message(name: &str) -> String {
    match ResearchStep::from_name(name) {
        Some(step) => step.description().to_string(),
        None => format!("Processing {}...", name),
    }
}
