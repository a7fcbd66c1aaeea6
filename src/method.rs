use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::error::RpcError;
use crate::error_codes;

/// Opaque identity of the calling connection or session.
///
/// The registry forwards this value to handlers untouched and never
/// interprets it; a transport typically derives it from a connection or
/// session token so a handler can target replies or session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SenderId(u64);

impl SenderId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for SenderId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sender:{}", self.0)
    }
}

/// Mutable in/out record handed to a parameterized handler for one dispatch.
///
/// `params` is read-only; the handler writes its outcome into `result` or
/// `error`. A non-sentinel `error` code wins over whatever is in `result`.
#[derive(Debug, Clone)]
pub struct CallContext {
    params: Value,
    pub result: Value,
    pub error: RpcError,
}

impl CallContext {
    pub fn new(params: Value) -> Self {
        Self {
            params,
            result: Value::Null,
            error: RpcError::none(),
        }
    }

    /// The request parameters; `Value::Null` means absent.
    pub fn params(&self) -> &Value {
        &self.params
    }
}

/// Failure reported by a handler body outside the call-context channel.
///
/// Carries its own JSON-RPC error code, so a handler can report e.g. an
/// invalid-params failure directly; `internal` covers everything else.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} ({code})")]
pub struct MethodError {
    pub code: i64,
    pub message: String,
}

impl MethodError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(error_codes::INTERNAL_ERROR, message)
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_PARAMS, message)
    }

    pub(crate) fn into_rpc_error(self) -> RpcError {
        RpcError::custom(self.code, self.message, Value::Null)
    }
}

/// A parameterized handler body: reads `ctx.params()`, writes `ctx.result`
/// or `ctx.error`. Returning `Err` is an equally authoritative failure
/// signal and propagates the error's own code and message.
pub trait CallHandler: Send + Sync {
    fn invoke(&self, sender: SenderId, ctx: &mut CallContext) -> Result<(), MethodError>;
}

impl<F> CallHandler for F
where
    F: Fn(SenderId, &mut CallContext) -> Result<(), MethodError> + Send + Sync,
{
    fn invoke(&self, sender: SenderId, ctx: &mut CallContext) -> Result<(), MethodError> {
        self(sender, ctx)
    }
}

/// A no-argument handler body: receives only the sender identity. The
/// registry rejects any request that names a no-argument method while
/// carrying parameters.
pub trait NoArgHandler: Send + Sync {
    fn invoke(&self, sender: SenderId) -> Result<(), MethodError>;
}

impl<F> NoArgHandler for F
where
    F: Fn(SenderId) -> Result<(), MethodError> + Send + Sync,
{
    fn invoke(&self, sender: SenderId) -> Result<(), MethodError> {
        self(sender)
    }
}

/// Registry binding of a name to a parameterized handler plus metadata.
/// Owned exclusively by the registry.
pub(crate) struct Method {
    name: String,
    description: Value,
    handler: Box<dyn CallHandler>,
}

impl Method {
    pub(crate) fn new(name: String, description: Value, handler: Box<dyn CallHandler>) -> Self {
        Self {
            name,
            description,
            handler,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn description(&self) -> &Value {
        &self.description
    }

    pub(crate) fn invoke(&self, sender: SenderId, ctx: &mut CallContext) -> Result<(), MethodError> {
        self.handler.invoke(sender, ctx)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method").field("name", &self.name).finish()
    }
}

/// Registry binding of a name to a no-argument handler plus metadata.
pub(crate) struct NoArgMethod {
    name: String,
    description: Value,
    handler: Box<dyn NoArgHandler>,
}

impl NoArgMethod {
    pub(crate) fn new(name: String, description: Value, handler: Box<dyn NoArgHandler>) -> Self {
        Self {
            name,
            description,
            handler,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn description(&self) -> &Value {
        &self.description
    }

    pub(crate) fn invoke(&self, sender: SenderId) -> Result<(), MethodError> {
        self.handler.invoke(sender)
    }
}

impl fmt::Debug for NoArgMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoArgMethod")
            .field("name", &self.name)
            .finish()
    }
}
