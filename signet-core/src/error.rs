//! Top-level error types for Signet.

use std::path::PathBuf;

use thiserror::Error;

use crate::channel::TransportError;

/// Top-level error type encompassing all Signet errors.
#[derive(Debug, Error)]
pub enum SignetError {
    /// The channel to the signer failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The signer binary did not pass pre-flight validation.
    #[error("signer binary {path:?} rejected: {reason}")]
    PreFlight { path: PathBuf, reason: String },

    /// The signer process could not be started.
    #[error("failed to start signer {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}
