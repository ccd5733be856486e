//! Configuration handling.
//!
//! Settings come from `signet.toml` in the platform configuration directory,
//! or from the file named with `--config`. Command-line flags override the
//! file.

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the platform configuration directory.
pub const CONFIG_FILE: &str = "signet.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignetConfig {
    /// How to launch the signer.
    pub signer: SignerConfig,

    /// How the operator is asked.
    pub prompt: PromptConfig,

    /// Logging level, used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: PathBuf,
}

/// The `[signer]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Signer executable.
    pub path: Option<PathBuf>,

    /// Start the signer in its stdio-UI test mode.
    pub test_mode: bool,

    /// Function-signature database handed to the signer.
    pub fourbyte_db: Option<PathBuf>,

    /// Extra arguments appended to the signer command line.
    pub extra_args: Vec<String>,
}

/// The `[prompt]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Seconds before an unanswered prompt is dismissed. Unset or zero
    /// waits forever.
    pub timeout_secs: Option<u64>,
}

impl PromptConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SignetConfig {
    fn default() -> Self {
        Self {
            signer: SignerConfig::default(),
            prompt: PromptConfig::default(),
            log_level: default_log_level(),
            config_path: PathBuf::new(),
        }
    }
}

/// Values taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub signer: Option<PathBuf>,
    pub test_mode: bool,
    pub verbose: bool,
    pub prompt_timeout: Option<u64>,
}

impl SignetConfig {
    /// Apply command-line values on top of the file.
    ///
    /// Flags can only switch test mode and verbose logging on.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(path) = overrides.signer {
            self.signer.path = Some(path);
        }
        if overrides.test_mode {
            self.signer.test_mode = true;
        }
        if overrides.verbose {
            self.log_level = "debug".to_string();
        }
        if let Some(secs) = overrides.prompt_timeout {
            self.prompt.timeout_secs = Some(secs);
        }
    }
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join(CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}

/// Load configuration from `path`, or from the default location.
///
/// A missing file at the default location yields the defaults. A file named
/// explicitly must exist.
pub fn load_config(path: Option<&Path>) -> Result<SignetConfig> {
    let config_path = match path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file {:?} does not exist", path);
            }
            path.to_path_buf()
        }
        None => default_config_path(),
    };

    let mut config = if config_path.exists() {
        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", config_path))?
    } else {
        SignetConfig::default()
    };

    config.config_path = config_path;
    Ok(config)
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "raibid-labs", "signet")
}
