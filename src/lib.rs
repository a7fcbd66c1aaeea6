//! # JSON-RPC 2.0 Method Registry
//!
//! A pure, transport-agnostic JSON-RPC 2.0 call-dispatch core. This crate
//! provides the protocol envelope types and a thread-safe method registry
//! without any transport-specific code.
//!
//! ## Features
//! - Full JSON-RPC 2.0 envelope compliance (requests, responses, errors)
//! - Transport agnostic (works with HTTP, WebSocket, TCP, etc.)
//! - Thread-safe registration and dispatch; handlers run outside the
//!   registry lock and may re-enter the registry
//! - Handler panics are contained and reported as internal errors
//!
//! ## Example
//! ```
//! use jsonrpc_registry::{CallContext, MethodRegistry, Request, SenderId};
//! use serde_json::json;
//!
//! let registry = MethodRegistry::new();
//! registry.register(
//!     "echo",
//!     json!({"doc": "echoes its params"}),
//!     |_sender: SenderId, ctx: &mut CallContext| {
//!         ctx.result = ctx.params().clone();
//!         Ok(())
//!     },
//! );
//!
//! let request = Request::call(json!(1), "echo", json!("hi"));
//! let response = registry.dispatch(SenderId::new(0), &request);
//! assert_eq!(response.result(), &json!("hi"));
//! ```

pub mod error;
pub mod json;
pub mod method;
pub mod prelude;
pub mod registry;
pub mod request;
pub mod response;

// Re-export main types
pub use error::{ParseError, RpcError, RpcErrorCode};
pub use method::{CallContext, CallHandler, MethodError, NoArgHandler, SenderId};
pub use registry::MethodRegistry;
pub use request::Request;
pub use response::Response;

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    /// Internal "no error" sentinel. Never serialized as a real error.
    pub const NO_ERROR: i64 = 0;

    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
