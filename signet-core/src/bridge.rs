//! Dispatch loop between the signer and the handlers.
//!
//! The bridge reads one line, decodes it, runs the matching handler, and
//! writes the reply before it reads the next line. Replies therefore go out
//! in the order the requests arrived, and at most one handler (and so at
//! most one prompt) is active at a time.
//!
//! Malformed lines, unknown methods and handler failures are answered with
//! an error response and the loop continues. Only a failure of the channel
//! itself stops it.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::AsyncWrite;
use tracing::{debug, info, trace, warn};

use crate::channel::{LineChannel, TransportError};
use crate::codec;
use crate::handler::HandlerContext;
use crate::protocol::{Id, Request, Response, RpcError};
use crate::registry::MethodRegistry;

/// Lifecycle state of a [`Bridge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Accepting requests.
    Running,
    /// The input ended or the transport failed; terminal.
    Stopped,
}

/// Counters reported when the bridge stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeSummary {
    /// Lines received and answered.
    pub requests: u64,
    /// Answers that carried an error.
    pub errors: u64,
}

/// Request/response relay over a [`LineChannel`].
pub struct Bridge<W> {
    channel: LineChannel<W>,
    registry: Arc<MethodRegistry>,
    context: HandlerContext,
    state: BridgeState,
    summary: BridgeSummary,
}

impl<W> Bridge<W>
where
    W: AsyncWrite + Unpin,
{
    /// Create a bridge in the [`BridgeState::Running`] state.
    pub fn new(
        channel: LineChannel<W>,
        registry: Arc<MethodRegistry>,
        context: HandlerContext,
    ) -> Self {
        Self {
            channel,
            registry,
            context,
            state: BridgeState::Running,
            summary: BridgeSummary::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Counters so far.
    pub fn summary(&self) -> BridgeSummary {
        self.summary
    }

    /// Serve requests until the input ends.
    ///
    /// Returns the counters on a clean end-of-stream. Calling `run` again
    /// after it returned is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when reading or writing the channel fails.
    /// The bridge is [`BridgeState::Stopped`] afterwards.
    pub async fn run(&mut self) -> Result<BridgeSummary, TransportError> {
        while self.state == BridgeState::Running {
            let line = match self.channel.receive().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!(
                        requests = self.summary.requests,
                        errors = self.summary.errors,
                        "signer closed the channel, stopping"
                    );
                    self.state = BridgeState::Stopped;
                    break;
                }
                Err(e) => {
                    warn!("failed to read from signer: {}", e);
                    self.state = BridgeState::Stopped;
                    return Err(e);
                }
            };

            let response = self.process(&line).await;

            if let Err(e) = self.reply(&response).await {
                warn!("failed to write to signer: {}", e);
                self.state = BridgeState::Stopped;
                return Err(e);
            }
        }

        Ok(self.summary)
    }

    async fn process(&mut self, line: &str) -> Response {
        self.summary.requests += 1;
        trace!("<< {}", line);

        let request = match codec::decode_request(line) {
            Ok(request) => request,
            Err(e) => {
                warn!(id = ?e.id(), "rejecting malformed request: {}", e);
                return e.into_response();
            }
        };

        let Request { id, method, params } = request;
        debug!(%id, %method, "received request");

        let handler = match self.registry.lookup(&method) {
            Ok(handler) => handler,
            Err(e) => {
                warn!(%id, "{}", e);
                return Response::error(Some(id), RpcError::method_not_found(&method));
            }
        };

        let context = self.context.clone();
        let outcome =
            tokio::task::spawn_blocking(move || handler.call(&context, params)).await;

        match outcome {
            Ok(Ok(result)) => Response::success(id, result),
            Ok(Err(e)) => {
                warn!(%id, %method, "handler failed: {}", e);
                Response::error(Some(id), e.to_rpc_error())
            }
            Err(e) => {
                warn!(%id, %method, "handler aborted: {}", e);
                Response::error(Some(id), RpcError::internal(format!("handler aborted: {}", e)))
            }
        }
    }

    async fn reply(&mut self, response: &Response) -> Result<(), TransportError> {
        if response.is_error() {
            self.summary.errors += 1;
        }

        let line = match codec::encode_response(response) {
            Ok(line) => line,
            Err(e) => {
                warn!("failed to encode response: {}", e);
                codec::encode_response(&Response::error(
                    response.id.clone(),
                    RpcError::internal(&e),
                ))?
            }
        };

        // Never log the encoded line: results carry passwords.
        debug!(
            id = %display_id(response.id.as_ref()),
            error = ?response.error_object().map(|e| e.code),
            "sending response"
        );
        self.channel.send(&line).await
    }
}

fn display_id(id: Option<&Id>) -> String {
    id.map(Id::to_string).unwrap_or_else(|| Value::Null.to_string())
}

