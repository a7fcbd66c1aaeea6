use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::JSONRPC_VERSION;
use crate::error::{ParseError, RpcError};
use crate::json::{has_key, has_string_key};

/// One outbound JSON-RPC response envelope.
///
/// A response carries either a result or an error, never both on the wire.
/// Internally both fields exist and `is_error` is decided by the error code:
/// a response whose error carries the "no error" sentinel is a success.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    id: Value,
    result: Value,
    error: RpcError,
}

impl Response {
    /// Creates a success response echoing the request id.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            result,
            error: RpcError::none(),
        }
    }

    /// Creates an error response. The id echoes the request id, or is null
    /// when the id could not be determined (e.g. parse failure).
    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            id,
            result: Value::Null,
            error,
        }
    }

    pub fn id(&self) -> &Value {
        &self.id
    }

    pub fn result(&self) -> &Value {
        &self.result
    }

    pub fn error(&self) -> &RpcError {
        &self.error
    }

    pub fn is_error(&self) -> bool {
        self.error.is_error()
    }

    /// Serializes to the wire envelope: always `jsonrpc` and `id`, then
    /// exactly one of `result` or `error`.
    pub fn to_json(&self) -> Value {
        let mut out = json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": self.id,
        });
        if self.is_error() {
            out["error"] = self.error.to_json();
        } else {
            out["result"] = self.result.clone();
        }
        out
    }

    /// Parses a wire envelope. Fails on a version mismatch, a missing `id`,
    /// or when neither `result` nor `error` is present.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        if !has_string_key(value, "jsonrpc") || value["jsonrpc"] != JSONRPC_VERSION {
            return Err(ParseError::Version);
        }
        if !has_key(value, "id") {
            return Err(ParseError::Id);
        }
        let id = value["id"].clone();
        if has_key(value, "result") {
            Ok(Self::success(id, value["result"].clone()))
        } else if has_key(value, "error") {
            Ok(Self::failure(id, RpcError::from_json(&value["error"])?))
        } else {
            Err(ParseError::ResultOrError)
        }
    }

    /// Indented rendering for logs and debugging.
    pub fn to_string_pretty(&self) -> String {
        format!("{:#}", self.to_json())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Response {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Response {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Response::from_json(&value).map_err(serde::de::Error::custom)
    }
}
