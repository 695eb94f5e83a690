//! Research API wire types
//!
//! Request and response bodies exchanged with the research backend:
//! - `POST {base}/research` (job creation)
//! - `GET {base}/research/{job_id}/stream` (progress stream, see [`crate::events`])
//! - `POST {base}/generate-pdf` (report export)
//!
//! Pure data only; HTTP plumbing lives in the client crate.

pub mod types;

pub use types::{JobCreated, JobRequest, PdfRequest};
