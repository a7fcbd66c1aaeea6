use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::RpcError;
use crate::error_codes;
use crate::method::{CallContext, CallHandler, Method, NoArgHandler, NoArgMethod, SenderId};
use crate::request::Request;
use crate::response::Response;

/// Thread-safe name → method-handle registry and call-dispatch engine.
///
/// The internal mutex guards only the map operations (lookup, insert, erase,
/// snapshot). A dispatch clones the handle's `Arc` under the lock and invokes
/// the handler after releasing it, so handler bodies may block or call back
/// into the registry without stalling unrelated dispatches or deadlocking
/// against concurrent registration.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    inner: Mutex<Maps>,
}

#[derive(Debug, Default)]
struct Maps {
    methods: HashMap<String, Arc<Method>>,
    no_arg_methods: HashMap<String, Arc<NoArgMethod>>,
}

/// Lookup outcome, resolved under the lock and consumed outside it.
enum Target {
    Call(Arc<Method>),
    NoArg(Arc<NoArgMethod>),
    Missing,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a parameterized method. An existing registration under the
    /// same name (of either arity) is replaced; in-flight invocations of the
    /// old handle finish undisturbed.
    ///
    /// `description` is opaque metadata surfaced by [`methods`], e.g. a
    /// human-readable summary or an argument schema. It plays no part in
    /// dispatch.
    ///
    /// [`methods`]: MethodRegistry::methods
    pub fn register<H>(&self, name: impl Into<String>, description: Value, handler: H)
    where
        H: CallHandler + 'static,
    {
        let name = name.into();
        let method = Arc::new(Method::new(name.clone(), description, Box::new(handler)));
        let mut maps = self.inner.lock();
        maps.no_arg_methods.remove(&name);
        maps.methods.insert(name, method);
    }

    /// Registers a no-argument method. Requests naming it must carry no
    /// params; any params are rejected with an invalid-request error.
    pub fn register_no_arg<H>(&self, name: impl Into<String>, description: Value, handler: H)
    where
        H: NoArgHandler + 'static,
    {
        let name = name.into();
        let method = Arc::new(NoArgMethod::new(name.clone(), description, Box::new(handler)));
        let mut maps = self.inner.lock();
        maps.methods.remove(&name);
        maps.no_arg_methods.insert(name, method);
    }

    /// Removes a method by name, of either arity. Unknown names are ignored.
    pub fn unregister(&self, name: &str) {
        let mut maps = self.inner.lock();
        if maps.methods.remove(name).is_none() {
            maps.no_arg_methods.remove(name);
        }
    }

    /// True iff `name` is currently registered, with either arity.
    pub fn has_method(&self, name: &str) -> bool {
        let maps = self.inner.lock();
        maps.methods.contains_key(name) || maps.no_arg_methods.contains_key(name)
    }

    /// Snapshot of all registered method names and their descriptions,
    /// independent of the live registry.
    pub fn methods(&self) -> HashMap<String, Value> {
        let maps = self.inner.lock();
        maps.methods
            .values()
            .map(|m| (m.name().to_string(), m.description().clone()))
            .chain(
                maps.no_arg_methods
                    .values()
                    .map(|m| (m.name().to_string(), m.description().clone())),
            )
            .collect()
    }

    /// Routes and invokes a JSON-RPC call, producing exactly one response.
    ///
    /// `sender` is forwarded to the handler untouched. Routing failures,
    /// handler-reported errors and handler panics all come back as error
    /// responses; no fault escapes dispatch.
    pub fn dispatch(&self, sender: SenderId, request: &Request) -> Response {
        let target = {
            let maps = self.inner.lock();
            if let Some(method) = maps.methods.get(request.method()) {
                Target::Call(Arc::clone(method))
            } else if let Some(method) = maps.no_arg_methods.get(request.method()) {
                Target::NoArg(Arc::clone(method))
            } else {
                Target::Missing
            }
        };

        let id = request.id().clone();
        match target {
            Target::Call(method) => {
                trace!(method = request.method(), %sender, "dispatching call");
                let mut ctx = CallContext::new(request.params().clone());
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| method.invoke(sender, &mut ctx)));
                match outcome {
                    // A non-sentinel error on the context wins over any result.
                    Ok(Ok(())) if ctx.error.is_error() => Response::failure(id, ctx.error),
                    Ok(Ok(())) => Response::success(id, ctx.result),
                    Ok(Err(fault)) => Response::failure(id, fault.into_rpc_error()),
                    Err(payload) => {
                        Response::failure(id, panic_error(payload.as_ref(), request))
                    }
                }
            }
            Target::NoArg(method) => {
                if !request.params().is_null() {
                    return Response::failure(
                        id,
                        RpcError::custom(
                            error_codes::INVALID_REQUEST,
                            "this method does not accept parameters",
                            request.to_json(),
                        ),
                    );
                }
                trace!(method = request.method(), %sender, "dispatching no-arg call");
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| method.invoke(sender)));
                match outcome {
                    Ok(Ok(())) => Response::success(id, Value::Null),
                    Ok(Err(fault)) => Response::failure(id, fault.into_rpc_error()),
                    Err(payload) => {
                        Response::failure(id, panic_error(payload.as_ref(), request))
                    }
                }
            }
            Target::Missing => {
                Response::failure(id, RpcError::method_not_found(request.to_json()))
            }
        }
    }

    /// Routes and invokes a JSON-RPC notification. Routing and invocation
    /// behave exactly as [`dispatch`], but the response is discarded; there
    /// is no reply channel to report an outcome on.
    ///
    /// [`dispatch`]: MethodRegistry::dispatch
    pub fn dispatch_notification(&self, sender: SenderId, request: &Request) {
        let response = self.dispatch(sender, request);
        if response.is_error() {
            debug!(
                method = request.method(),
                code = response.error().code(),
                "discarding error outcome of a notification"
            );
        }
    }
}

/// Converts a caught panic payload into an internal-error object carrying
/// the serialized request.
fn panic_error(payload: &(dyn Any + Send), request: &Request) -> RpcError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    };
    RpcError::internal_error(message, request.to_json())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::MethodError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo_handler(_sender: SenderId, ctx: &mut CallContext) -> Result<(), MethodError> {
        ctx.result = ctx.params().clone();
        Ok(())
    }

    #[test]
    fn test_parameterized_success() {
        let registry = MethodRegistry::new();
        registry.register("echo", Value::Null, echo_handler);

        let request = Request::call(json!(1), "echo", json!({"k": [1, 2]}));
        let response = registry.dispatch(SenderId::new(0), &request);
        assert!(!response.is_error());
        assert_eq!(response.id(), &json!(1));
        assert_eq!(response.result(), &json!({"k": [1, 2]}));
    }

    #[test]
    fn test_context_error_wins_over_result() {
        let registry = MethodRegistry::new();
        registry.register(
            "conflicted",
            Value::Null,
            |_sender: SenderId, ctx: &mut CallContext| {
                ctx.result = json!("ignored");
                ctx.error = RpcError::custom(-32001, "went sideways", Value::Null);
                Ok(())
            },
        );

        let response = registry.dispatch(
            SenderId::new(0),
            &Request::call(json!(2), "conflicted", Value::Null),
        );
        assert!(response.is_error());
        assert_eq!(response.error().code(), -32001);
        assert_eq!(response.error().message(), "went sideways");
    }

    #[test]
    fn test_method_error_propagates_code() {
        let registry = MethodRegistry::new();
        registry.register(
            "strict",
            Value::Null,
            |_sender: SenderId, _ctx: &mut CallContext| {
                Err(MethodError::invalid_params("expected an object"))
            },
        );

        let response = registry.dispatch(
            SenderId::new(0),
            &Request::call(json!(3), "strict", json!([])),
        );
        assert_eq!(response.error().code(), error_codes::INVALID_PARAMS);
        assert_eq!(response.error().message(), "expected an object");
    }

    #[test]
    fn test_method_not_found_carries_request() {
        let registry = MethodRegistry::new();
        let request = Request::call(json!(4), "nope", Value::Null);
        let response = registry.dispatch(SenderId::new(0), &request);
        assert_eq!(response.error().code(), error_codes::METHOD_NOT_FOUND);
        assert_eq!(response.error().data(), &request.to_json());
    }

    #[test]
    fn test_no_arg_rejects_params() {
        let registry = MethodRegistry::new();
        registry.register_no_arg("ping", Value::Null, |_sender: SenderId| Ok(()));

        let request = Request::call(json!(5), "ping", json!([1]));
        let response = registry.dispatch(SenderId::new(0), &request);
        assert_eq!(response.error().code(), error_codes::INVALID_REQUEST);
        assert_eq!(response.error().data(), &request.to_json());

        let bare = Request::call(json!(6), "ping", Value::Null);
        let response = registry.dispatch(SenderId::new(0), &bare);
        assert!(!response.is_error());
        assert_eq!(response.result(), &Value::Null);
    }

    #[test]
    fn test_panic_contained_as_internal_error() {
        let registry = MethodRegistry::new();
        registry.register(
            "boom",
            Value::Null,
            |_sender: SenderId, _ctx: &mut CallContext| -> Result<(), MethodError> {
                panic!("handler exploded");
            },
        );

        let request = Request::call(json!(7), "boom", Value::Null);
        let response = registry.dispatch(SenderId::new(0), &request);
        assert_eq!(response.error().code(), error_codes::INTERNAL_ERROR);
        assert_eq!(response.error().message(), "handler exploded");
        assert_eq!(response.error().data(), &request.to_json());
    }

    #[test]
    fn test_formatted_panic_message_preserved() {
        // Formatted panics carry a String payload rather than a &str.
        let registry = MethodRegistry::new();
        registry.register(
            "boom",
            Value::Null,
            |_sender: SenderId, ctx: &mut CallContext| -> Result<(), MethodError> {
                panic!("bad state: {}", ctx.params());
            },
        );

        let request = Request::call(json!(8), "boom", json!(3));
        let response = registry.dispatch(SenderId::new(0), &request);
        assert_eq!(response.error().code(), error_codes::INTERNAL_ERROR);
        assert_eq!(response.error().message(), "bad state: 3");
    }

    #[test]
    fn test_registration_replaces_across_arities() {
        let registry = MethodRegistry::new();
        registry.register("m", json!("v1"), echo_handler);
        registry.register_no_arg("m", json!("v2"), |_sender: SenderId| Ok(()));

        // The name must live in exactly one map.
        let methods = registry.methods();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods["m"], json!("v2"));

        let response =
            registry.dispatch(SenderId::new(0), &Request::call(json!(8), "m", Value::Null));
        assert_eq!(response.result(), &Value::Null);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = MethodRegistry::new();
        registry.register_no_arg("once", Value::Null, |_sender: SenderId| Ok(()));
        assert!(registry.has_method("once"));
        registry.unregister("once");
        assert!(!registry.has_method("once"));
        registry.unregister("once");
        assert!(!registry.has_method("once"));
    }

    #[test]
    fn test_methods_snapshot_is_independent() {
        let registry = MethodRegistry::new();
        registry.register("a", json!({"doc": "a"}), echo_handler);
        let mut snapshot = registry.methods();
        snapshot.insert("b".to_string(), Value::Null);
        assert!(!registry.has_method("b"));
        assert_eq!(registry.methods().len(), 1);
    }

    #[test]
    fn test_handler_may_reenter_registry() {
        let registry = Arc::new(MethodRegistry::new());
        let inner = Arc::clone(&registry);
        registry.register(
            "introspect",
            Value::Null,
            move |_sender: SenderId, ctx: &mut CallContext| {
                let mut names: Vec<String> = inner.methods().into_keys().collect();
                names.sort();
                ctx.result = json!(names);
                Ok(())
            },
        );

        let response = registry.dispatch(
            SenderId::new(0),
            &Request::call(json!(9), "introspect", Value::Null),
        );
        assert_eq!(response.result(), &json!(["introspect"]));
    }

    #[test]
    fn test_notification_outcome_discarded() {
        static HITS: AtomicUsize = AtomicUsize::new(0);
        let registry = MethodRegistry::new();
        registry.register_no_arg("tick", Value::Null, |_sender: SenderId| {
            HITS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        registry.dispatch_notification(SenderId::new(0), &Request::notification("tick", Value::Null));
        assert_eq!(HITS.load(Ordering::SeqCst), 1);

        // Errors during a notification are swallowed.
        registry.dispatch_notification(
            SenderId::new(0),
            &Request::notification("unknown", Value::Null),
        );
    }

    #[test]
    fn test_sender_forwarded_untouched() {
        let registry = MethodRegistry::new();
        registry.register(
            "who",
            Value::Null,
            |sender: SenderId, ctx: &mut CallContext| {
                ctx.result = json!(sender.raw());
                Ok(())
            },
        );

        let response = registry.dispatch(
            SenderId::new(41),
            &Request::call(json!(10), "who", Value::Null),
        );
        assert_eq!(response.result(), &json!(41));
    }
}
