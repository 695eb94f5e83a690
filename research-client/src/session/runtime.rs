//! Session runtime task
//!
//! Runs a [`SessionController`] on its own tokio task. User commands arrive on
//! an mpsc channel; state snapshots go out on the controller's watch channel.
//! While a submission is in flight, Submit/Reset/Dispose cancel it and run
//! next, other commands wait until it finishes.

use super::controller::SessionController;
use crate::models::SessionState;
use research_common::api::JobRequest;
use std::collections::VecDeque;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

const COMMAND_CAPACITY: usize = 32;

/// User intent delivered to the runtime
#[derive(Debug)]
pub enum SessionCommand {
    Submit(JobRequest),
    Reset,
    ExportReport(oneshot::Sender<Option<PathBuf>>),
    CopyReport(oneshot::Sender<bool>),
    Dispose,
}

impl SessionCommand {
    /// Commands that cancel a submission still in flight
    pub fn preempts_submission(&self) -> bool {
        matches!(
            self,
            SessionCommand::Submit(_) | SessionCommand::Reset | SessionCommand::Dispose
        )
    }

    fn name(&self) -> &'static str {
        match self {
            SessionCommand::Submit(_) => "submit",
            SessionCommand::Reset => "reset",
            SessionCommand::ExportReport(_) => "export_report",
            SessionCommand::CopyReport(_) => "copy_report",
            SessionCommand::Dispose => "dispose",
        }
    }
}

/// The runtime task has stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("session runtime is no longer running")]
pub struct RuntimeClosed;

/// Cloneable front-end handle to a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub async fn submit(&self, request: JobRequest) -> Result<(), RuntimeClosed> {
        self.send(SessionCommand::Submit(request)).await
    }

    pub async fn reset(&self) -> Result<(), RuntimeClosed> {
        self.send(SessionCommand::Reset).await
    }

    /// Export the report; resolves to the written file, if any
    pub async fn export_report(&self) -> Result<Option<PathBuf>, RuntimeClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::ExportReport(reply)).await?;
        rx.await.map_err(|_| RuntimeClosed)
    }

    /// Copy the report to the clipboard; resolves to whether it was copied
    pub async fn copy_report(&self) -> Result<bool, RuntimeClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::CopyReport(reply)).await?;
        rx.await.map_err(|_| RuntimeClosed)
    }

    /// Stop the runtime and close any open stream
    pub async fn dispose(&self) -> Result<(), RuntimeClosed> {
        self.send(SessionCommand::Dispose).await
    }

    /// Latest published state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_for<F>(&self, predicate: F) -> Result<SessionState, RuntimeClosed>
    where
        F: FnMut(&SessionState) -> bool,
    {
        let mut rx = self.state.clone();
        let state = rx.wait_for(predicate).await.map_err(|_| RuntimeClosed)?;
        let snapshot = (*state).clone();
        Ok(snapshot)
    }

    async fn send(&self, command: SessionCommand) -> Result<(), RuntimeClosed> {
        self.commands.send(command).await.map_err(|_| RuntimeClosed)
    }
}

/// Event loop owning a [`SessionController`]
pub struct SessionRuntime {
    controller: SessionController,
    commands: mpsc::Receiver<SessionCommand>,
    /// Commands deferred while a submission was in flight
    pending: VecDeque<SessionCommand>,
}

impl SessionRuntime {
    /// Spawn the runtime on the current tokio runtime
    pub fn spawn(controller: SessionController) -> (SessionHandle, JoinHandle<()>) {
        let (commands_tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let state = controller.subscribe();
        let runtime = Self {
            controller,
            commands,
            pending: VecDeque::new(),
        };
        let task = tokio::spawn(runtime.run());
        (
            SessionHandle {
                commands: commands_tx,
                state,
            },
            task,
        )
    }

    async fn run(mut self) {
        info!("Session runtime started");

        loop {
            let Some(command) = self.next_command().await else {
                debug!("All session handles dropped");
                self.controller.dispose();
                break;
            };
            debug!(command = command.name(), "Session command");

            match command {
                SessionCommand::Submit(request) => {
                    if let Some(preempting) = self.run_submission(request).await {
                        self.pending.push_front(preempting);
                    }
                }
                SessionCommand::Reset => self.controller.reset(),
                SessionCommand::ExportReport(reply) => {
                    let path = self.controller.export_report().await;
                    let _ = reply.send(path);
                }
                SessionCommand::CopyReport(reply) => {
                    let copied = self.controller.copy_report().await;
                    let _ = reply.send(copied);
                }
                SessionCommand::Dispose => {
                    self.controller.dispose();
                    break;
                }
            }
        }

        info!("Session runtime stopped");
    }

    /// Next command to execute, applying stream frames and timers meanwhile
    ///
    /// `None` once every handle is gone.
    async fn next_command(&mut self) -> Option<SessionCommand> {
        loop {
            if let Some(command) = self.pending.pop_front() {
                return Some(command);
            }

            let streaming = self.controller.has_open_stream();
            let copied_deadline = self.controller.copied_deadline();

            tokio::select! {
                biased;

                command = self.commands.recv() => return command,

                _ = self.controller.next_frame(), if streaming => {}

                _ = tokio::time::sleep_until(copied_deadline.unwrap_or_else(Instant::now)),
                    if copied_deadline.is_some() => {
                    self.controller.clear_copied();
                }
            }
        }
    }

    /// Drive a submission to completion unless a preempting command arrives
    ///
    /// Returns the preempting command; the submission future is dropped.
    async fn run_submission(&mut self, request: JobRequest) -> Option<SessionCommand> {
        let submission = self.controller.submit(request);
        tokio::pin!(submission);

        loop {
            tokio::select! {
                biased;

                () = &mut submission => return None,

                command = self.commands.recv() => match command {
                    Some(command) if command.preempts_submission() => {
                        info!(command = command.name(), "Cancelling submission in flight");
                        return Some(command);
                    }
                    Some(command) => self.pending.push_back(command),
                    None => return Some(SessionCommand::Dispose),
                },
            }
        }
    }
}
