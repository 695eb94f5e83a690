//! Error types for research-client
//!
//! Session failures fall into two groups:
//! - **Fatal to the job**: submission, transport and backend-reported errors
//!   move the session to the Error phase.
//! - **Contained**: malformed frames, export and clipboard failures are logged
//!   or shown to the user without touching the phase.

use thiserror::Error;

/// Message shown when the progress stream drops without a terminal event
pub const CONNECTION_LOST_MESSAGE: &str = "Connection lost or server error";

/// Session error taxonomy
///
/// The `Display` text of every variant is the user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Job creation failed or returned no job identifier
    #[error("{0}")]
    Submission(String),

    /// Progress stream failed or closed without a terminal event
    #[error("{0}")]
    Transport(String),

    /// Backend reported failure through an `error` frame
    #[error("{0}")]
    StreamEvent(String),

    /// Frame could not be decoded or carries an unknown `type`
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// PDF export failed
    #[error("{0}")]
    Export(String),

    /// Clipboard copy failed
    #[error("{0}")]
    Clipboard(String),
}

impl SessionError {
    /// Whether this error ends the current job
    ///
    /// Only submission, transport and backend-reported errors may move the
    /// session to the Error phase; everything else is contained where it is
    /// detected.
    pub fn moves_to_error_phase(&self) -> bool {
        matches!(
            self,
            SessionError::Submission(_) | SessionError::Transport(_) | SessionError::StreamEvent(_)
        )
    }
}

/// Result type for session collaborators
pub type SessionResult<T> = Result<T, SessionError>;
