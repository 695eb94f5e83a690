//! research-client - Company research command line client
//!
//! Submits one research job, follows its progress stream, logs status changes
//! and finalized queries to stderr, and prints the final report to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use research_client::models::{Phase, SessionState, StatusMessage, SubPhase};
use research_client::services::{ResearchApiClient, SystemClipboard};
use research_client::{SessionController, SessionRuntime, SessionServices, SessionSettings};
use research_common::api::JobRequest;
use research_common::config::ConfigResolver;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "research-client", version, about = "Research a company and print the report")]
struct Cli {
    /// Company name
    company: String,

    /// Company website
    #[arg(long, default_value = "")]
    url: String,

    #[arg(long, default_value = "")]
    industry: String,

    /// Headquarters location
    #[arg(long, default_value = "")]
    hq: String,

    /// Research API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Directory for exported PDFs
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Configuration file (default: <config_dir>/company-research/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Export the report as PDF after completion
    #[arg(long)]
    export_pdf: bool,

    /// Copy the report to the clipboard after completion
    #[arg(long)]
    copy: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = ConfigResolver::new()
        .with_api_url(cli.api_url.clone())
        .with_download_dir(cli.download_dir.clone())
        .with_config_file(cli.config.clone())
        .resolve()
        .context("Failed to resolve configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting research-client v{}", env!("CARGO_PKG_VERSION"));
    info!(
        api_url = %config.api_url,
        download_dir = %config.download_dir.display(),
        "Configuration resolved"
    );

    let api = ResearchApiClient::from_config(&config).context("Failed to build HTTP client")?;
    let services = SessionServices::from_api_client(api, Arc::new(SystemClipboard::detect()));
    let controller = SessionController::new(services, SessionSettings::from(&config));
    let (handle, task) = SessionRuntime::spawn(controller);

    let mut updates = handle.subscribe();
    let request = JobRequest::new(cli.company.clone(), &cli.url, &cli.industry, &cli.hq);
    handle.submit(request).await?;

    let interrupted = tokio::select! {
        state = follow_progress(&mut updates) => Ok(state),
        _ = tokio::signal::ctrl_c() => Err(()),
    };
    let Ok(finished) = interrupted else {
        warn!("Interrupted, abandoning research job");
        handle.reset().await?;
        handle.dispose().await?;
        task.await.context("Session runtime panicked")?;
        return Ok(ExitCode::from(130));
    };

    let code = match finished {
        Some(state) if state.phase == Phase::Complete => {
            if let Some(report) = &state.report {
                println!("{}", report);
            }

            if cli.export_pdf {
                match handle.export_report().await? {
                    Some(path) => info!("Report saved to {}", path.display()),
                    None => warn!(
                        "PDF export failed: {}",
                        handle.state().action_error.unwrap_or_default()
                    ),
                }
            }

            if cli.copy {
                if handle.copy_report().await? {
                    info!("Report copied to clipboard");
                } else {
                    warn!(
                        "Clipboard copy failed: {}",
                        handle.state().action_error.unwrap_or_default()
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Some(state) => {
            error!(
                "Research failed: {}",
                state.error_message.as_deref().unwrap_or("unknown error")
            );
            ExitCode::FAILURE
        }
        None => {
            error!("Session runtime stopped before the job finished");
            ExitCode::FAILURE
        }
    };

    handle.dispose().await?;
    task.await.context("Session runtime panicked")?;

    Ok(code)
}

/// Log progress until the session reaches Complete or Error
///
/// Returns `None` if the runtime goes away first.
async fn follow_progress(updates: &mut watch::Receiver<SessionState>) -> Option<SessionState> {
    let mut last_status: Option<StatusMessage> = None;
    let mut last_sub_phase: Option<SubPhase> = None;
    let mut logged_queries = 0;

    loop {
        if updates.changed().await.is_err() {
            return None;
        }
        let state = updates.borrow_and_update().clone();

        if state.sub_phase != last_sub_phase {
            if let Some(sub_phase) = state.sub_phase {
                info!(sub_phase = sub_phase.as_str(), "Research stage changed");
            }
            last_sub_phase = state.sub_phase;
        }

        if state.status_message != last_status {
            if let Some(status) = &state.status_message {
                info!(step = %status.step, "{}", status.message);
            }
            last_status = state.status_message.clone();
        }

        // Finalized queries only ever grow within one job
        for query in state.queries.iter().skip(logged_queries) {
            info!(
                category = %query.category,
                query_number = query.number,
                "Query: {}",
                query.text
            );
        }
        logged_queries = state.queries.len();

        if state.phase.is_terminal() {
            return Some(state);
        }
    }
}
