//! research-client library interface
//!
//! Client-side controller for company research jobs: submits a job to the
//! research backend, follows its progress stream, and exposes the resulting
//! phase, status, queries and report as an observable [`SessionState`].

pub mod classifier;
pub mod error;
pub mod models;
pub mod phase_machine;
pub mod query_tracker;
pub mod services;
pub mod session;
pub mod steps;

pub use crate::error::{SessionError, SessionResult};
pub use crate::models::{Phase, SessionState, SubPhase};
pub use crate::session::{
    SessionController, SessionHandle, SessionRuntime, SessionServices, SessionSettings,
};
