use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::JSONRPC_VERSION;
use crate::error::ParseError;
use crate::json::has_string_key;

/// One inbound JSON-RPC request envelope.
///
/// The `id` is carried verbatim as any JSON value; a null id marks a
/// *notification*, which must not receive a response. A request is immutable
/// after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    id: Value,
    method: String,
    params: Value,
}

impl Request {
    /// Creates a call expecting exactly one response. Any JSON value is
    /// accepted as the id; passing `Value::Null` creates a notification.
    pub fn call(id: Value, method: impl Into<String>, params: Value) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Creates a notification (no id, no response expected).
    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self::call(Value::Null, method, params)
    }

    pub fn id(&self) -> &Value {
        &self.id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request parameters; `Value::Null` means absent.
    pub fn params(&self) -> &Value {
        &self.params
    }

    /// True iff the id is absent, i.e. no response may be sent.
    pub fn is_notification(&self) -> bool {
        self.id.is_null()
    }

    /// Serializes to the wire envelope. `jsonrpc`, `id` and `method` are
    /// always emitted (a notification's id serializes as null); `params` is
    /// emitted only when non-null.
    pub fn to_json(&self) -> Value {
        let mut out = json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": self.id,
            "method": self.method,
        });
        if !self.params.is_null() {
            out["params"] = self.params.clone();
        }
        out
    }

    /// Parses a wire envelope.
    ///
    /// Fails when the `jsonrpc` field is missing, not a string or not exactly
    /// `"2.0"`, or when `method` is missing or not a string. The `id` and
    /// `params` fields are carried through untouched; either may be absent.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        if !has_string_key(value, "jsonrpc") || value["jsonrpc"] != JSONRPC_VERSION {
            return Err(ParseError::Version);
        }
        if !has_string_key(value, "method") {
            return Err(ParseError::Method);
        }
        let method = value["method"].as_str().unwrap_or_default().to_string();
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let params = value.get("params").cloned().unwrap_or(Value::Null);
        Ok(Self { id, method, params })
    }

    /// Indented rendering for logs and debugging.
    pub fn to_string_pretty(&self) -> String {
        format!("{:#}", self.to_json())
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Request {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Request {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Request::from_json(&value).map_err(serde::de::Error::custom)
    }
}
