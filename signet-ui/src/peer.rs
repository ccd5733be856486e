//! Signer process supervision.
//!
//! The signer is started with its stdio UI enabled. Its stdout carries
//! requests to us and its stdin carries our replies; stderr is free-form
//! log output that we forward to our own log at debug level.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use signet_core::{LineChannel, SignetError, TransportError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::SignerConfig;

/// Function-signature database looked up next to the signer binary.
pub const FOURBYTE_DB_FILE: &str = "4byte.json";

/// Program and arguments used to start the signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl PeerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Build the signer command line from the `[signer]` table.
    ///
    /// # Errors
    ///
    /// Returns [`SignetError::Config`] when no signer path is configured.
    pub fn from_config(config: &SignerConfig) -> Result<Self, SignetError> {
        let program = config.path.clone().ok_or_else(|| SignetError::Config {
            message: "no signer binary configured (use --signer or set signer.path)".to_string(),
        })?;

        let fourbyte_db = config
            .fourbyte_db
            .clone()
            .or_else(|| default_fourbyte_db(&program));

        let mut command = Self::new(program).arg("--stdio-ui");
        if config.test_mode {
            command = command.arg("--stdio-ui-test");
        }
        if let Some(db) = fourbyte_db {
            command = command.arg("--4bytedb").arg(db);
        }
        for extra in &config.extra_args {
            command = command.arg(extra);
        }
        Ok(command)
    }
}

fn default_fourbyte_db(program: &Path) -> Option<PathBuf> {
    let candidate = program.parent()?.join(FOURBYTE_DB_FILE);
    candidate.is_file().then_some(candidate)
}

/// Check that `path` names a regular file before trying to run it.
pub fn pre_flight(path: &Path) -> Result<(), SignetError> {
    let metadata = std::fs::metadata(path).map_err(|e| SignetError::PreFlight {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !metadata.is_file() {
        return Err(SignetError::PreFlight {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }
    Ok(())
}

/// A running signer.
///
/// The child is killed if this value is dropped before [`wait`](Self::wait).
pub struct PeerProcess {
    child: Child,
    program: PathBuf,
    stderr_task: Option<JoinHandle<()>>,
}

impl PeerProcess {
    /// Start the signer with piped standard streams.
    pub fn spawn(command: &PeerCommand) -> Result<Self, SignetError> {
        debug!(program = %command.program.display(), args = ?command.args, "spawning signer");

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SignetError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let stderr_task = child.stderr.take().map(|stderr| tokio::spawn(drain_stderr(stderr)));
        info!(pid = ?child.id(), "signer started");

        Ok(Self {
            child,
            program: command.program.clone(),
            stderr_task,
        })
    }

    /// Operating system process id, while the child is running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Take the signer's stdout and stdin as a line channel.
    ///
    /// Returns `None` if the channel was already taken.
    pub fn channel(&mut self) -> Option<LineChannel<ChildStdin>> {
        let stdout = self.child.stdout.take()?;
        let stdin = self.child.stdin.take()?;
        Some(LineChannel::new(stdout, stdin))
    }

    /// Wait for the signer to exit.
    ///
    /// The channel must be dropped first so the signer sees its input close.
    pub async fn wait(mut self) -> Result<ExitStatus, SignetError> {
        let status = self.child.wait().await.map_err(TransportError::from)?;
        if let Some(task) = self.stderr_task.take() {
            let _ = task.await;
        }
        info!(program = %self.program.display(), %status, "signer exited");
        Ok(status)
    }
}

async fn drain_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => debug!(target: "signer", "{}", line),
            Ok(None) => break,
            Err(e) => {
                debug!("stopped reading signer stderr: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(command: &PeerCommand) -> Vec<String> {
        command
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_command_requires_a_path() {
        let err = PeerCommand::from_config(&SignerConfig::default()).unwrap_err();
        assert!(matches!(err, SignetError::Config { .. }));
    }

    #[test]
    fn test_command_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = SignerConfig {
            path: Some(dir.path().join("clef")),
            test_mode: true,
            fourbyte_db: Some(PathBuf::from("/data/4byte.json")),
            extra_args: vec!["--nousb".into()],
        };

        let command = PeerCommand::from_config(&config).unwrap();
        assert_eq!(command.program, dir.path().join("clef"));
        assert_eq!(
            args(&command),
            ["--stdio-ui", "--stdio-ui-test", "--4bytedb", "/data/4byte.json", "--nousb"]
        );
    }

    #[test]
    fn test_fourbyte_db_next_to_signer() {
        let dir = tempfile::tempdir().unwrap();
        let config = SignerConfig {
            path: Some(dir.path().join("clef")),
            ..Default::default()
        };

        let command = PeerCommand::from_config(&config).unwrap();
        assert_eq!(args(&command), ["--stdio-ui"]);

        let db = dir.path().join(FOURBYTE_DB_FILE);
        std::fs::write(&db, "{}").unwrap();
        let command = PeerCommand::from_config(&config).unwrap();
        assert_eq!(
            args(&command),
            ["--stdio-ui".to_string(), "--4bytedb".to_string(), db.to_string_lossy().into_owned()]
        );
    }

    #[test]
    fn test_pre_flight() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("clef");
        std::fs::write(&binary, "").unwrap();

        assert!(pre_flight(&binary).is_ok());
        assert!(matches!(
            pre_flight(&dir.path().join("missing")),
            Err(SignetError::PreFlight { .. })
        ));
        assert!(matches!(
            pre_flight(dir.path()),
            Err(SignetError::PreFlight { reason, .. }) if reason == "not a regular file"
        ));
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let result = PeerProcess::spawn(&PeerCommand::new("/nonexistent/signet-signer"));
        assert!(matches!(result, Err(SignetError::Spawn { .. })));
    }
}
