//! Handlers for the methods the signer calls.
//!
//! A handler receives the request parameters and a [`HandlerContext`],
//! consults the operator through the context's [`Prompter`], and returns the
//! JSON result the signer expects for that method.
//!
//! Handlers block until the operator answers. The bridge runs them on a
//! blocking worker, one at a time.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::prompt::Prompter;
use crate::protocol::{Params, RpcError};

mod approve;
mod notify;
pub mod render;
pub mod types;

pub use approve::{
    ApproveExport, ApproveImport, ApproveListing, ApproveNewAccount, ApproveSignData, ApproveTx,
};
pub use notify::{ShowError, ShowInfo};

/// State shared with every handler call.
#[derive(Clone)]
pub struct HandlerContext {
    prompter: Arc<dyn Prompter>,
}

impl HandlerContext {
    /// Create a context around a presentation capability.
    pub fn new(prompter: Arc<dyn Prompter>) -> Self {
        Self { prompter }
    }

    /// The presentation capability to consult.
    pub fn prompter(&self) -> &dyn Prompter {
        self.prompter.as_ref()
    }
}

impl fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerContext").finish_non_exhaustive()
    }
}

/// Failure raised by a handler.
///
/// Each variant maps to the error object sent back to the signer; none of
/// them stops the bridge.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Parameters were missing or malformed.
    #[error("invalid params: {message}")]
    InvalidParams { message: String },

    /// The handler refused the request with its own code.
    #[error("{message} (code: {code})")]
    Rejected {
        code: i32,
        message: String,
        data: Option<Value>,
    },

    /// The handler failed unexpectedly.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl HandlerError {
    /// Shorthand for [`HandlerError::InvalidParams`].
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Shorthand for [`HandlerError::Rejected`] without data.
    pub fn rejected(code: i32, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Error object sent back to the signer.
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            Self::InvalidParams { message } => RpcError::invalid_params(message),
            Self::Rejected {
                code,
                message,
                data,
            } => {
                let error = RpcError::new(*code, message.clone());
                match data {
                    Some(data) => error.with_data(data.clone()),
                    None => error,
                }
            }
            Self::Internal { message } => RpcError::internal(message),
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("failed to serialize result: {}", e),
        }
    }
}

/// One RPC method implementation.
pub trait Handler: Send + Sync {
    /// Handle one request.
    fn call(&self, ctx: &HandlerContext, params: Params) -> Result<Value, HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&HandlerContext, Params) -> Result<Value, HandlerError> + Send + Sync,
{
    fn call(&self, ctx: &HandlerContext, params: Params) -> Result<Value, HandlerError> {
        self(ctx, params)
    }
}

/// Serialize a typed response into the JSON result.
pub(crate) fn to_result<T: Serialize>(response: &T) -> Result<Value, HandlerError> {
    Ok(serde_json::to_value(response)?)
}
