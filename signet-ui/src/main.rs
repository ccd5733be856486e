//! Signet
//!
//! Terminal front-end for an external signer. Starts the signer with its
//! stdio UI enabled and asks the operator about every request it sends.
//!
//! # Running
//!
//! ```bash
//! signet --signer /usr/local/bin/clef
//! # test mode, verbose logging:
//! signet -s ./clef -t -v
//! # dismiss prompts nobody answers within two minutes:
//! signet -s ./clef --timeout 120
//! ```
//!
//! Exits with status 0 when the signer closes its output, and 1 when the
//! signer cannot be checked or started or the channel to it breaks.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use signet_ui::{load_config, pre_flight, run_session, Overrides, PeerCommand, TerminalPrompter};

#[derive(Parser)]
#[command(name = "signet")]
#[command(about = "Approve signer requests from the terminal")]
#[command(version)]
struct Cli {
    /// Signer executable
    #[arg(short, long)]
    signer: Option<PathBuf>,

    /// Start the signer in stdio-UI test mode
    #[arg(short, long)]
    test: bool,

    /// Configuration file (default: signet.toml in the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dismiss prompts left unanswered for this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    config.apply(Overrides {
        signer: cli.signer,
        test_mode: cli.test,
        verbose: cli.verbose,
        prompt_timeout: cli.timeout,
    });

    init_logging(&config.log_level);
    info!("Loaded configuration from {:?}", config.config_path);

    let command = PeerCommand::from_config(&config.signer)?;
    pre_flight(&command.program)?;

    let mut prompter = TerminalPrompter::stdio();
    if let Some(timeout) = config.prompt.timeout() {
        info!("Prompts time out after {:?}", timeout);
        prompter = prompter.with_timeout(timeout);
    }

    let report = run_session(&command, Arc::new(prompter)).await?;
    info!(
        requests = report.summary.requests,
        errors = report.summary.errors,
        "Signet stopped"
    );
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
