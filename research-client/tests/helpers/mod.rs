//! Test Helper Utilities
//!
//! Shared utilities for testing research-client

#![allow(dead_code)]

pub mod fakes;
pub mod test_server;

pub use fakes::{frame, Fakes, FakeClipboard, FakeExporter, FakeSubmitter, FakeTransport};
pub use test_server::{ServerScript, TestServer};

use research_client::SessionSettings;
use research_common::api::JobRequest;
use std::path::Path;
use std::time::Duration;

/// Settings with no settle delay and a short copied flag
pub fn fast_settings(download_dir: &Path) -> SessionSettings {
    SessionSettings {
        settle_delay: Duration::ZERO,
        copied_flag_duration: Duration::from_millis(100),
        download_dir: download_dir.to_path_buf(),
    }
}

pub fn acme_request() -> JobRequest {
    JobRequest::new("Acme", "acme.com", "Manufacturing", "")
}
