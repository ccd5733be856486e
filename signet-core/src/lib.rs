//! # Signet Core
//!
//! Core library for Signet, the approval front-end of an external signer.
//!
//! The signer runs as a child process and talks JSON-RPC over its standard
//! streams, one message per line. This crate provides:
//! - A line channel and codec for the envelopes on those streams
//! - A registry mapping each [`Method`] to a [`Handler`]
//! - The [`Bridge`] dispatch loop that answers requests in order
//! - The handler set, which asks a human through a [`Prompter`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use signet_core::{Bridge, HandlerContext, LineChannel, MethodRegistry, ScriptedPrompter};
//!
//! async fn serve(child: &mut tokio::process::Child) -> Result<(), signet_core::SignetError> {
//!     let stdout = child.stdout.take().unwrap();
//!     let stdin = child.stdin.take().unwrap();
//!
//!     let channel = LineChannel::new(stdout, stdin);
//!     let registry = Arc::new(MethodRegistry::with_defaults());
//!     let context = HandlerContext::new(Arc::new(ScriptedPrompter::default()));
//!
//!     Bridge::new(channel, registry, context).run().await?;
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod channel;
pub mod codec;
pub mod error;
pub mod handler;
pub mod method;
pub mod prompt;
pub mod protocol;
pub mod registry;

// Re-export commonly used types at crate root
pub use bridge::{
    Bridge,
    BridgeState,
    BridgeSummary,
};

pub use channel::{
    LineChannel,
    TransportError,
    MAX_LINE_BYTES,
};

pub use codec::{
    CodecError,
    DecodeError,
};

pub use error::SignetError;

pub use handler::{
    Handler,
    HandlerContext,
    HandlerError,
};

pub use method::Method;

pub use prompt::{
    Answer,
    MessageKind,
    Prompt,
    Prompter,
    ScriptedPrompter,
    Secret,
};

pub use protocol::{
    Id,
    NumberToken,
    Outcome,
    Params,
    Request,
    Response,
    RpcError,
};

pub use registry::{
    MethodRegistry,
    RegistryError,
};
