//! One-way notifications from the signer.

use serde_json::Value;

use super::{Handler, HandlerContext, HandlerError};
use crate::prompt::MessageKind;
use crate::protocol::Params;

fn text(params: &Params) -> &str {
    params.get("text").and_then(Value::as_str).unwrap_or_default()
}

/// Handles `ShowError`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShowError;

impl Handler for ShowError {
    fn call(&self, ctx: &HandlerContext, params: Params) -> Result<Value, HandlerError> {
        ctx.prompter()
            .message(MessageKind::Error, "Signer error", text(&params));
        Ok(Value::Null)
    }
}

/// Handles `ShowInfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShowInfo;

impl Handler for ShowInfo {
    fn call(&self, ctx: &HandlerContext, params: Params) -> Result<Value, HandlerError> {
        ctx.prompter()
            .message(MessageKind::Info, "Signer info", text(&params));
        Ok(Value::Null)
    }
}
