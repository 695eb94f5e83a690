//! Data models for research-client

pub mod session_state;

pub use session_state::{
    FinalizedQuery, JobContext, PartialQuery, Phase, QueryKey, SessionState, StatusMessage,
    SubPhase,
};
