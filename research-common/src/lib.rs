//! # Research Common Library
//!
//! Shared code for the company research client including:
//! - Error type and result alias
//! - Configuration resolution (CLI → ENV → TOML → compiled default)
//! - Wire types for the research API
//! - Research event types (ResearchEvent enum)
//! - Server-Sent Events frame decoding

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
