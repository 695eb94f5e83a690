//! Research session lifecycle
//!
//! [`SessionController`] owns the session state and applies stream frames to
//! it. [`SessionRuntime`] drives a controller on its own task and interleaves
//! user commands with inbound frames; front ends talk to it through a
//! [`SessionHandle`].

mod controller;
mod runtime;

pub use controller::{pdf_file_name, SessionController, SessionServices, SessionSettings};
pub use runtime::{RuntimeClosed, SessionCommand, SessionHandle, SessionRuntime};
