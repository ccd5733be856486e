//! JSON-RPC envelope types exchanged with the signer.
//!
//! This module defines the data carried on every line of the stdio channel:
//! - [`Id`] - Opaque request identifier, echoed back unmodified
//! - [`Request`] - A method call with its parameter map
//! - [`Response`] - A reply carrying exactly one [`Outcome`]
//! - [`RpcError`] - Structured error object with a JSON-RPC code

use jsonrpsee_types::error::ErrorCode;
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::Value;
use std::fmt;

/// Parameter map passed to a handler.
///
/// Keys the handler does not know about are kept as-is.
pub type Params = serde_json::Map<String, Value>;

/// Request identifier assigned by the signer.
///
/// Numbers are kept as the token that arrived on the wire (`1e2`, `-0`,
/// integers beyond 64 bits), so the reply carries exactly the same text.
/// Two ids are equal when their text is equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Id {
    /// Numeric identifier (e.g. `7`).
    Number(NumberToken),
    /// String identifier (e.g. `"7"`).
    String(String),
}

/// A JSON number kept exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NumberToken(String);

impl NumberToken {
    /// Accept `text` if it is a single JSON number.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        serde_json::from_str::<serde_json::Number>(text)
            .ok()
            .map(|_| Self(text.to_string()))
    }

    /// The number as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NumberToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Id {
    /// Extract an identifier from a parsed JSON value.
    ///
    /// Returns `None` for anything other than a string or a number. Numbers
    /// are rendered by `serde_json`, so prefer [`Id::from_raw`] when the
    /// original text is available.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self::Number(NumberToken(n.to_string()))),
            Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }

    /// Extract an identifier from its raw JSON text.
    pub fn from_raw(raw: &RawValue) -> Option<Self> {
        let text = raw.get().trim();
        if text.starts_with('"') {
            serde_json::from_str(text).ok().map(Self::String)
        } else {
            NumberToken::parse(text).map(Self::Number)
        }
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Number(n) => RawValue::from_string(n.0.clone())
                .map_err(<S::Error as ser::Error>::custom)?
                .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Self::from_raw(&raw)
            .ok_or_else(|| <D::Error as de::Error>::custom("id must be a string or a number"))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        Self::Number(NumberToken(n.to_string()))
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// A decoded method call.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Identifier to echo in the response.
    pub id: Id,

    /// Wire name of the method (e.g. `ApproveTx`).
    pub method: String,

    /// Named parameters.
    pub params: Params,
}

impl Request {
    /// Create a new request.
    pub fn new(id: impl Into<Id>, method: impl Into<String>, params: Params) -> Self {
        Self {
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// Error code (standard JSON-RPC codes or handler-defined).
    pub code: i32,

    /// Human-readable description.
    pub message: String,

    /// Optional structured detail.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub data: Option<Value>,
}

impl RpcError {
    /// Create an error with an arbitrary code.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured detail to the error.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The line could not be parsed as JSON.
    pub fn parse_error(detail: impl fmt::Display) -> Self {
        Self::standard(ErrorCode::ParseError, detail)
    }

    /// The JSON was valid but not a usable request envelope.
    pub fn invalid_request(detail: impl fmt::Display) -> Self {
        Self::standard(ErrorCode::InvalidRequest, detail)
    }

    /// No handler is registered under `method`.
    pub fn method_not_found(method: &str) -> Self {
        Self::standard(ErrorCode::MethodNotFound, format!("no handler for '{}'", method))
    }

    /// Parameters were missing or of the wrong shape.
    pub fn invalid_params(detail: impl fmt::Display) -> Self {
        Self::standard(ErrorCode::InvalidParams, detail)
    }

    /// Something failed inside the bridge or a handler.
    pub fn internal(detail: impl fmt::Display) -> Self {
        Self::standard(ErrorCode::InternalError, detail)
    }

    fn standard(code: ErrorCode, detail: impl fmt::Display) -> Self {
        Self::new(code.code(), format!("{}: {}", code.message(), detail))
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)
    }
}

/// Either a handler result or an error, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Successful result value (may be `null`).
    Result(Value),
    /// Error object.
    Error(RpcError),
}

/// A reply to one [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Identifier copied from the request, `None` when it was unrecoverable.
    pub id: Option<Id>,

    /// Result or error.
    pub outcome: Outcome,
}

impl Response {
    /// Successful response for the request with `id`.
    pub fn success(id: Id, result: Value) -> Self {
        Self {
            id: Some(id),
            outcome: Outcome::Result(result),
        }
    }

    /// Error response; pass `None` when the identifier is unknown.
    pub fn error(id: Option<Id>, error: RpcError) -> Self {
        Self {
            id,
            outcome: Outcome::Error(error),
        }
    }

    /// Whether this response carries an error.
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }

    /// The error object, if any.
    pub fn error_object(&self) -> Option<&RpcError> {
        match &self.outcome {
            Outcome::Error(e) => Some(e),
            Outcome::Result(_) => None,
        }
    }

    /// The result value, if any.
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(v) => Some(v),
            Outcome::Error(_) => None,
        }
    }
}

/// Deserialize a field that is present as `Some`, even when it is `null`.
///
/// Combined with `#[serde(default)]` this separates an absent field from
/// an explicit `null`.
pub(crate) fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
