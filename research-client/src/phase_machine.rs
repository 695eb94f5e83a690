//! Session lifecycle state machine
//!
//! ```text
//! Idle ──submit──▶ Submitting ──first action──▶ Streaming(sub-phase)
//!                      │                             │
//!                      ├──────── Terminate ──────────┼──▶ Complete | Error
//!                      └──── submission/transport failure ──▶ Error
//! any ──reset──▶ Idle        Complete ──resubmit──▶ Resetting ──▶ Submitting
//! ```
//!
//! Complete and Error are terminal: actions arriving afterwards are ignored.
//! The report and error message are stored inside the terminal states, so a
//! report exists exactly when the phase is Complete and an error message
//! exactly when it is Error.

use crate::classifier::{DomainAction, Termination};
use crate::error::SessionError;
use crate::models::{Phase, StatusMessage, SubPhase};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Lifecycle state with the data each state owns
#[derive(Debug, Clone, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Resetting,
    Submitting,
    Streaming(SubPhase),
    Complete { report: String },
    Error { message: String },
}

impl Lifecycle {
    fn phase(&self) -> Phase {
        match self {
            Lifecycle::Idle => Phase::Idle,
            Lifecycle::Resetting => Phase::Resetting,
            Lifecycle::Submitting => Phase::Submitting,
            Lifecycle::Streaming(_) => Phase::Streaming,
            Lifecycle::Complete { .. } => Phase::Complete,
            Lifecycle::Error { .. } => Phase::Error,
        }
    }
}

/// Phase change record, returned for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub old_phase: Phase,
    pub new_phase: Phase,
    pub transitioned_at: DateTime<Utc>,
}

/// Current lifecycle phase plus the last status message
#[derive(Debug, Clone)]
pub struct PhaseStateMachine {
    lifecycle: Lifecycle,
    status: Option<StatusMessage>,
}

impl Default for PhaseStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseStateMachine {
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Idle,
            status: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    /// Active pipeline stage; None outside Streaming
    pub fn sub_phase(&self) -> Option<SubPhase> {
        match self.lifecycle {
            Lifecycle::Streaming(sub_phase) => Some(sub_phase),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn report(&self) -> Option<&str> {
        match &self.lifecycle {
            Lifecycle::Complete { report } => Some(report),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.lifecycle {
            Lifecycle::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Submitting or Streaming
    pub fn is_active(&self) -> bool {
        self.phase().is_active()
    }

    /// Start a new job from any state
    pub fn submit(&mut self) -> Transition {
        self.status = Some(StatusMessage::new("Processing", "Starting research..."));
        self.transition(Lifecycle::Submitting)
    }

    /// Clear the previous job ahead of a resubmission
    pub fn begin_reset(&mut self) -> Transition {
        self.status = None;
        self.transition(Lifecycle::Resetting)
    }

    /// Return to Idle from any state
    pub fn reset(&mut self) -> Transition {
        self.status = None;
        self.transition(Lifecycle::Idle)
    }

    /// Apply one domain action
    ///
    /// Actions are only honoured while Submitting or Streaming. Query actions
    /// carry no phase information and leave the machine untouched. Returns
    /// the transition when the phase changed.
    pub fn apply(&mut self, action: &DomainAction) -> Option<Transition> {
        if !self.is_active() {
            debug!(phase = self.phase().as_str(), "Ignoring action outside active phase");
            return None;
        }

        match action {
            DomainAction::SetPhase(sub_phase) => {
                let changed = self.phase() != Phase::Streaming;
                let transition = self.transition(Lifecycle::Streaming(*sub_phase));
                changed.then_some(transition)
            }
            DomainAction::SetStatus(status) => {
                self.status = Some(status.clone());
                None
            }
            DomainAction::UpsertPartialQuery(_) | DomainAction::PromoteQuery(_) => None,
            DomainAction::Terminate(Termination::Complete { report }) => {
                self.status = Some(StatusMessage::new(
                    "Complete",
                    "Research completed successfully",
                ));
                Some(self.transition(Lifecycle::Complete {
                    report: report.clone(),
                }))
            }
            DomainAction::Terminate(Termination::Error(err)) => self.fail(err),
        }
    }

    /// Fail the active job
    ///
    /// No-op unless Submitting or Streaming, and for errors that are contained
    /// where they are detected (malformed frames, export, clipboard).
    pub fn fail(&mut self, err: &SessionError) -> Option<Transition> {
        if !self.is_active() {
            return None;
        }
        if !err.moves_to_error_phase() {
            debug!("Not failing the job for a contained error: {}", err);
            return None;
        }
        Some(self.transition(Lifecycle::Error {
            message: err.to_string(),
        }))
    }

    fn transition(&mut self, next: Lifecycle) -> Transition {
        let old_phase = self.phase();
        self.lifecycle = next;
        Transition {
            old_phase,
            new_phase: self.phase(),
            transitioned_at: Utc::now(),
        }
    }
}
