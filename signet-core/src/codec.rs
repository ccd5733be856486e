//! Line codec for JSON-RPC envelopes.
//!
//! Every message is one compact JSON object. `serde_json` escapes control
//! characters inside strings, so an encoded message never contains a raw
//! newline and can be framed by [`LineChannel`](crate::channel::LineChannel).
//!
//! Requests accept `params` as an object, as a one-element array wrapping an
//! object (the shape signers use for stdio UIs), as an empty array, or not
//! at all. All of these normalize to a [`Params`] map.

use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use serde_json::value::RawValue;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::{present, Id, Outcome, Params, Request, Response, RpcError};

/// Protocol version written on every outgoing message.
pub const JSONRPC_VERSION: &str = "2.0";

/// Error decoding a line into an envelope.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The line is not valid JSON.
    #[error("parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// The JSON is not a usable envelope.
    #[error("invalid request: {reason}")]
    InvalidRequest { id: Option<Id>, reason: String },

    /// The envelope is fine but `params` has an unsupported shape.
    #[error("invalid params: {reason}")]
    InvalidParams { id: Id, reason: String },
}

impl DecodeError {
    /// The request identifier, when it could be recovered.
    pub fn id(&self) -> Option<&Id> {
        match self {
            Self::Parse(_) => None,
            Self::InvalidRequest { id, .. } => id.as_ref(),
            Self::InvalidParams { id, .. } => Some(id),
        }
    }

    /// Error object to report back to the peer.
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            Self::Parse(e) => RpcError::parse_error(e),
            Self::InvalidRequest { reason, .. } => RpcError::invalid_request(reason),
            Self::InvalidParams { reason, .. } => RpcError::invalid_params(reason),
        }
    }

    /// Build the error response for this failure.
    pub fn into_response(self) -> Response {
        let error = self.to_rpc_error();
        let id = match self {
            Self::Parse(_) => None,
            Self::InvalidRequest { id, .. } => id,
            Self::InvalidParams { id, .. } => Some(id),
        };
        Response::error(id, error)
    }

    fn invalid(id: Option<Id>, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            id,
            reason: reason.into(),
        }
    }
}

/// Error encoding an envelope.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Serialization failed.
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct OutgoingRequest<'a> {
    jsonrpc: &'static str,
    id: &'a Id,
    method: &'a str,
    params: &'a Params,
}

#[derive(Serialize)]
struct OutgoingResponse<'a> {
    jsonrpc: &'static str,
    id: Option<&'a Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a RpcError>,
}

#[derive(Deserialize)]
struct RawEnvelope<'a> {
    #[serde(borrow, default)]
    id: Option<&'a RawValue>,
}

#[derive(Deserialize)]
struct IncomingResponse {
    #[serde(default)]
    id: Option<Id>,
    #[serde(default, deserialize_with = "present")]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// Decode one line into a [`Request`].
///
/// # Errors
///
/// - [`DecodeError::Parse`] when the line is not JSON
/// - [`DecodeError::InvalidRequest`] when `id` or `method` is missing or malformed
/// - [`DecodeError::InvalidParams`] when `params` cannot be read as a map
pub fn decode_request(line: &str) -> Result<Request, DecodeError> {
    let value: Value = serde_json::from_str(line).map_err(DecodeError::Parse)?;

    let Value::Object(mut envelope) = value else {
        return Err(DecodeError::invalid(None, "request must be a JSON object"));
    };

    let id = match envelope.get("id") {
        Some(value) => exact_id(line)
            .or_else(|| Id::from_value(value))
            .ok_or_else(|| DecodeError::invalid(None, "id must be a string or a number"))?,
        None => return Err(DecodeError::invalid(None, "missing id")),
    };

    let method = match envelope.remove("method") {
        Some(Value::String(method)) => method,
        Some(_) => {
            return Err(DecodeError::invalid(Some(id), "method must be a string"));
        }
        None => return Err(DecodeError::invalid(Some(id), "missing method")),
    };

    let params = match normalize_params(envelope.remove("params")) {
        Ok(params) => params,
        Err(reason) => return Err(DecodeError::InvalidParams { id, reason }),
    };

    Ok(Request { id, method, params })
}

/// Re-read the id from the line so numbers keep their original text.
fn exact_id(line: &str) -> Option<Id> {
    let envelope: RawEnvelope<'_> = serde_json::from_str(line).ok()?;
    envelope.id.and_then(Id::from_raw)
}

fn normalize_params(raw: Option<Value>) -> Result<Params, String> {
    match raw {
        None | Some(Value::Null) => Ok(Params::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(Value::Array(mut items)) => match items.len() {
            0 => Ok(Params::new()),
            1 => match items.pop() {
                Some(Value::Object(map)) => Ok(map),
                _ => Err("positional parameter must be an object".to_string()),
            },
            n => Err(format!("expected at most 1 positional parameter, got {}", n)),
        },
        Some(_) => Err("params must be an object or an array".to_string()),
    }
}

/// Encode a [`Request`] as one line.
pub fn encode_request(request: &Request) -> Result<String, CodecError> {
    let wire = OutgoingRequest {
        jsonrpc: JSONRPC_VERSION,
        id: &request.id,
        method: &request.method,
        params: &request.params,
    };
    Ok(serde_json::to_string(&wire)?)
}

/// Encode a [`Response`] as one line.
pub fn encode_response(response: &Response) -> Result<String, CodecError> {
    let (result, error) = match &response.outcome {
        Outcome::Result(value) => (Some(value), None),
        Outcome::Error(error) => (None, Some(error)),
    };
    let wire = OutgoingResponse {
        jsonrpc: JSONRPC_VERSION,
        id: response.id.as_ref(),
        result,
        error,
    };
    Ok(serde_json::to_string(&wire)?)
}

/// Decode one line into a [`Response`].
///
/// Exactly one of `result` and `error` must be present; `"result": null`
/// counts as present.
pub fn decode_response(line: &str) -> Result<Response, DecodeError> {
    let wire: IncomingResponse = serde_json::from_str(line).map_err(|e| match e.classify() {
        Category::Data => DecodeError::invalid(None, e.to_string()),
        _ => DecodeError::Parse(e),
    })?;

    let outcome = match (wire.result, wire.error) {
        (Some(result), None) => Outcome::Result(result),
        (None, Some(error)) => Outcome::Error(error),
        (Some(_), Some(_)) => {
            return Err(DecodeError::invalid(
                wire.id,
                "response carries both result and error",
            ));
        }
        (None, None) => {
            return Err(DecodeError::invalid(
                wire.id,
                "response carries neither result nor error",
            ));
        }
    };

    Ok(Response {
        id: wire.id,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn test_decode_object_params() {
        let req = decode_request(
            r#"{"jsonrpc":"2.0","id":1,"method":"ShowInfo","params":{"text":"hello"}}"#,
        )
        .unwrap();
        assert_eq!(req.id, Id::from(1u64));
        assert_eq!(req.method, "ShowInfo");
        assert_eq!(req.params.get("text"), Some(&json!("hello")));
    }

    #[test]
    fn test_decode_positional_object_params() {
        let req = decode_request(
            r#"{"jsonrpc":"2.0","id":"a","method":"ApproveTx","params":[{"transaction":{"to":"0x1"}}]}"#,
        )
        .unwrap();
        assert_eq!(req.id, Id::from("a"));
        assert_eq!(req.params.get("transaction"), Some(&json!({"to": "0x1"})));
    }

    #[test]
    fn test_decode_missing_params_is_empty() {
        let req = decode_request(r#"{"id":3,"method":"ShowInfo"}"#).unwrap();
        assert!(req.params.is_empty());

        let req = decode_request(r#"{"id":3,"method":"ShowInfo","params":[]}"#).unwrap();
        assert!(req.params.is_empty());
    }

    #[test]
    fn test_decode_preserves_unknown_fields() {
        let req = decode_request(
            r#"{"id":1,"method":"ShowInfo","params":{"text":"t","future_field":{"nested":[1,2]}}}"#,
        )
        .unwrap();
        assert_eq!(req.params.get("future_field"), Some(&json!({"nested": [1, 2]})));
    }

    #[test]
    fn test_decode_not_json() {
        let err = decode_request("this is not json").unwrap_err();
        assert!(matches!(err, DecodeError::Parse(_)));
        assert!(err.id().is_none());
        assert_eq!(err.to_rpc_error().code, -32700);
    }

    #[test]
    fn test_decode_missing_method_keeps_id() {
        let err = decode_request(r#"{"id":"9","params":{}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidRequest { .. }));
        assert_eq!(err.id(), Some(&Id::from("9")));
        assert_eq!(err.to_rpc_error().code, -32600);
    }

    #[test]
    fn test_decode_missing_id() {
        let err = decode_request(r#"{"method":"ShowInfo","params":{}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidRequest { id: None, .. }));
    }

    #[test]
    fn test_decode_null_id_is_rejected() {
        let err = decode_request(r#"{"id":null,"method":"ShowInfo"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidRequest { id: None, .. }));
    }

    #[test]
    fn test_decode_non_object() {
        let err = decode_request("[1,2,3]").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidRequest { id: None, .. }));
    }

    #[test]
    fn test_decode_bad_params_shape() {
        let err = decode_request(r#"{"id":4,"method":"ShowInfo","params":"text"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidParams { .. }));
        assert_eq!(err.to_rpc_error().code, -32602);

        let err = decode_request(r#"{"id":4,"method":"ShowInfo","params":[{},{}]}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidParams { .. }));
    }

    #[test]
    fn test_numeric_id_is_echoed_verbatim() {
        for raw in ["1e2", "18446744073709551616", "-0", "1.50", "7"] {
            let line = format!(r#"{{"jsonrpc":"2.0","id":{},"method":"ShowInfo"}}"#, raw);
            let request = decode_request(&line).unwrap();

            let response = Response::success(request.id.clone(), Value::Null);
            let reply = encode_response(&response).unwrap();
            assert!(
                reply.contains(&format!(r#""id":{},"#, raw)),
                "id {} came back as {}",
                raw,
                reply
            );
            assert_eq!(decode_response(&reply).unwrap().id, Some(request.id));
        }
    }

    #[test]
    fn test_error_reply_keeps_numeric_id() {
        let err = decode_request(r#"{"id":1.0e3,"params":{}}"#).unwrap_err();
        let reply = encode_response(&err.into_response()).unwrap();
        assert!(reply.contains(r#""id":1.0e3,"#), "{}", reply);
    }

    #[test]
    fn test_into_response_without_id() {
        let response = decode_request("{").unwrap_err().into_response();
        assert_eq!(response.id, None);
        assert_eq!(response.error_object().map(|e| e.code), Some(-32700));

        let line = encode_response(&response).unwrap();
        let wire: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(wire["id"], Value::Null);
    }

    #[test]
    fn test_encode_response_has_no_raw_newline() {
        let response = Response::success(
            Id::from(1u64),
            json!({"text": "line one\nline two\r\n", "nested": {"a": ["\n"]}}),
        );
        let line = encode_response(&response).unwrap();
        assert!(!line.contains('\n'));
        assert!(!line.contains('\r'));
        assert!(line.contains(r#""jsonrpc":"2.0""#));
    }

    #[test]
    fn test_response_roundtrip() {
        let responses = vec![
            Response::success(Id::from(1u64), json!({"approved": true, "password": "p\nw"})),
            Response::success(Id::from("tx-1"), Value::Null),
            Response::error(Some(Id::from(2u64)), RpcError::method_not_found("NoSuchOp")),
            Response::error(None, RpcError::parse_error("bad line")),
            Response::error(
                Some(Id::from(3u64)),
                RpcError::new(-1, "denied").with_data(json!({"reason": "user"})),
            ),
            Response::error(Some(Id::from(4u64)), RpcError::new(5, "odd").with_data(Value::Null)),
        ];

        for response in responses {
            let line = encode_response(&response).unwrap();
            assert_eq!(decode_response(&line).unwrap(), response, "line: {}", line);
        }
    }

    #[test]
    fn test_request_roundtrip() {
        let request = Request::new(
            "req-7",
            "ApproveListing",
            params(json!({"accounts": [{"address": "0xabc"}], "meta": {"remote": "ipc"}})),
        );
        let line = encode_request(&request).unwrap();
        assert_eq!(decode_request(&line).unwrap(), request);
    }

    #[test]
    fn test_decode_response_requires_one_outcome() {
        let err = decode_response(r#"{"id":1}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidRequest { .. }));

        let err = decode_response(r#"{"id":1,"result":1,"error":{"code":1,"message":"x"}}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidRequest { .. }));
    }

    #[test]
    fn test_decode_response_syntax_error() {
        let err = decode_response("{\"id\":").unwrap_err();
        assert!(matches!(err, DecodeError::Parse(_)));
    }
}
