use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::error_codes;
use crate::json::{has_integer_key, has_string_key};

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorCode {
    /// Internal sentinel meaning "no error". A response whose error carries
    /// this code is a success response; the code is never serialized.
    NoError,
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerError(i64), // -32099 to -32000
}

impl RpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            RpcErrorCode::NoError => error_codes::NO_ERROR,
            RpcErrorCode::ParseError => error_codes::PARSE_ERROR,
            RpcErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            RpcErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            RpcErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            RpcErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            RpcErrorCode::ServerError(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RpcErrorCode::NoError => "no error",
            RpcErrorCode::ParseError => "parse error",
            RpcErrorCode::InvalidRequest => "invalid request",
            RpcErrorCode::MethodNotFound => "method not found",
            RpcErrorCode::InvalidParams => "invalid params",
            RpcErrorCode::InternalError => "internal error",
            RpcErrorCode::ServerError(_) => "server error",
        }
    }

    /// Maps a raw code back to its well-known variant, if any.
    pub fn from_code(code: i64) -> Option<RpcErrorCode> {
        match code {
            error_codes::NO_ERROR => Some(RpcErrorCode::NoError),
            error_codes::PARSE_ERROR => Some(RpcErrorCode::ParseError),
            error_codes::INVALID_REQUEST => Some(RpcErrorCode::InvalidRequest),
            error_codes::METHOD_NOT_FOUND => Some(RpcErrorCode::MethodNotFound),
            error_codes::INVALID_PARAMS => Some(RpcErrorCode::InvalidParams),
            error_codes::INTERNAL_ERROR => Some(RpcErrorCode::InternalError),
            c if (error_codes::SERVER_ERROR_START..=error_codes::SERVER_ERROR_END).contains(&c) => {
                Some(RpcErrorCode::ServerError(c))
            }
            _ => None,
        }
    }
}

impl fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Default message for a raw error code, used when a message was not supplied.
pub(crate) fn default_message(code: i64) -> String {
    match RpcErrorCode::from_code(code) {
        Some(known) => known.message().to_string(),
        None => "unknown error".to_string(),
    }
}

/// JSON-RPC error object, as carried inside an error response.
///
/// A default-constructed `RpcError` carries the "no error" sentinel code 0
/// and marks a success response.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    code: i64,
    message: String,
    data: Value,
}

impl RpcError {
    /// The "no error" sentinel.
    pub fn none() -> Self {
        Self::from_parts(error_codes::NO_ERROR, None, Value::Null)
    }

    pub fn new(code: RpcErrorCode) -> Self {
        Self::from_parts(code.code(), None, Value::Null)
    }

    pub fn with_data(code: RpcErrorCode, data: Value) -> Self {
        Self::from_parts(code.code(), None, data)
    }

    /// Builds an error from a raw code, explicit message and data. The
    /// message is derived from the code when empty.
    pub fn custom(code: i64, message: impl Into<String>, data: Value) -> Self {
        let message = message.into();
        let message = if message.is_empty() { None } else { Some(message) };
        Self::from_parts(code, message, data)
    }

    pub fn parse_error(data: Value) -> Self {
        Self::with_data(RpcErrorCode::ParseError, data)
    }

    pub fn invalid_request(data: Value) -> Self {
        Self::with_data(RpcErrorCode::InvalidRequest, data)
    }

    pub fn method_not_found(data: Value) -> Self {
        Self::with_data(RpcErrorCode::MethodNotFound, data)
    }

    pub fn invalid_params(data: Value) -> Self {
        Self::with_data(RpcErrorCode::InvalidParams, data)
    }

    pub fn internal_error(message: impl Into<String>, data: Value) -> Self {
        Self::custom(error_codes::INTERNAL_ERROR, message, data)
    }

    fn from_parts(code: i64, message: Option<String>, data: Value) -> Self {
        Self {
            code,
            message: message.unwrap_or_else(|| default_message(code)),
            data,
        }
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The optional data payload; `Value::Null` means absent.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// True iff this is a real error rather than the "no error" sentinel.
    pub fn is_error(&self) -> bool {
        self.code != error_codes::NO_ERROR
    }

    /// Serializes to the `{code, message, data?}` wire object. `data` is
    /// omitted when null.
    pub fn to_json(&self) -> Value {
        let mut out = json!({
            "code": self.code,
            "message": self.message,
        });
        if !self.data.is_null() {
            out["data"] = self.data.clone();
        }
        out
    }

    /// Parses a `{code, message?, data?}` wire object. The code is required;
    /// a missing message is derived from the code.
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        if !has_integer_key(value, "code") {
            return Err(ParseError::ErrorCode);
        }
        let code = value["code"].as_i64().unwrap_or(error_codes::INTERNAL_ERROR);
        let message = if has_string_key(value, "message") {
            value["message"].as_str().map(str::to_string)
        } else {
            None
        };
        let data = value.get("data").cloned().unwrap_or(Value::Null);
        Ok(Self::from_parts(code, message, data))
    }
}

impl Default for RpcError {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

impl Serialize for RpcError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RpcError {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        RpcError::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// Raised when a JSON value does not form a valid JSON-RPC envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing or invalid jsonrpc version string")]
    Version,
    #[error("missing or invalid method")]
    Method,
    #[error("missing id")]
    Id,
    #[error("neither result nor error present")]
    ResultOrError,
    #[error("error object is missing an integer code")]
    ErrorCode,
}
