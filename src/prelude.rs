//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use jsonrpc_registry::prelude::*;
//! ```

pub use crate::error::{ParseError, RpcError, RpcErrorCode};
pub use crate::method::{CallContext, CallHandler, MethodError, NoArgHandler, SenderId};
pub use crate::registry::MethodRegistry;
pub use crate::request::Request;
pub use crate::response::Response;

// Standard error codes
pub use crate::error_codes::*;
