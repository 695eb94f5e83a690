//! Clipboard access through the platform copy tool
//!
//! The report text is piped into `pbcopy` (macOS), `clip` (Windows),
//! `wl-copy` (Wayland) or `xclip -selection clipboard` (X11).

use super::Clipboard;
use crate::error::{SessionError, SessionResult};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

const COPY_FAILED: &str = "Failed to copy to clipboard";

/// Clipboard backed by an external copy command reading stdin
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    program: String,
    args: Vec<String>,
}

impl SystemClipboard {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Pick the copy tool for the current platform
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("pbcopy", Vec::new())
        } else if cfg!(target_os = "windows") {
            Self::new("clip", Vec::new())
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Self::new("wl-copy", Vec::new())
        } else {
            Self::new(
                "xclip",
                vec!["-selection".to_string(), "clipboard".to_string()],
            )
        }
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> SessionResult<()> {
        debug!(program = %self.program, bytes = text.len(), "Copying text to clipboard");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| copy_failed(&self.program, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| copy_failed(&self.program, e))?;
            // Closing stdin lets the tool see end of input
            drop(stdin);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| copy_failed(&self.program, e))?;

        if status.success() {
            Ok(())
        } else {
            warn!(program = %self.program, ?status, "Clipboard tool failed");
            Err(SessionError::Clipboard(COPY_FAILED.to_string()))
        }
    }
}

fn copy_failed(program: &str, err: std::io::Error) -> SessionError {
    warn!(program, "Clipboard tool error: {}", err);
    SessionError::Clipboard(COPY_FAILED.to_string())
}
