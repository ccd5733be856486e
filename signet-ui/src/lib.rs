//! Signet UI Library
//!
//! Starts the signer, serves its approval requests on the terminal, and
//! reports how the session ended. Exposed as a library so the session can
//! be driven from tests with a scripted prompter.

pub mod config;
pub mod peer;
pub mod terminal;

use std::process::ExitStatus;
use std::sync::Arc;

use signet_core::{Bridge, BridgeSummary, HandlerContext, MethodRegistry, Prompter, SignetError};
use tracing::{info, warn};

pub use config::{load_config, Overrides, PromptConfig, SignerConfig, SignetConfig};
pub use peer::{pre_flight, PeerCommand, PeerProcess};
pub use terminal::TerminalPrompter;

/// How a session ended.
#[derive(Debug, Clone, Copy)]
pub struct SessionReport {
    pub summary: BridgeSummary,
    pub status: ExitStatus,
}

/// Run the signer and answer its requests until it closes its output.
///
/// # Errors
///
/// Fails if the signer cannot be started or the channel to it breaks. The
/// signer is killed in that case.
pub async fn run_session(
    command: &PeerCommand,
    prompter: Arc<dyn Prompter>,
) -> Result<SessionReport, SignetError> {
    let mut peer = PeerProcess::spawn(command)?;
    let channel = peer.channel().ok_or_else(|| SignetError::Spawn {
        program: command.program.clone(),
        source: std::io::Error::other("signer stdio was not captured"),
    })?;

    let registry = Arc::new(MethodRegistry::with_defaults());
    let mut bridge = Bridge::new(channel, registry, HandlerContext::new(prompter));
    let summary = bridge.run().await?;

    // Closes the signer's stdin.
    drop(bridge);

    let status = peer.wait().await?;
    if status.success() {
        info!(requests = summary.requests, errors = summary.errors, "session finished");
    } else {
        warn!(%status, requests = summary.requests, "signer exited with failure");
    }

    Ok(SessionReport { summary, status })
}
