//! # Implementation Registry
//!
//! The locally supplied implementation: an arbitrarily nested, string-keyed
//! tree of async methods answering inbound requests.
//!
//! ## Invariants
//!
//! - Resolution failures are application errors to forward, never local
//!   panics: the peer always receives a terminal answer.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use riftpack::Value;
use riftrpc::Fault;

/// A servicing method's future.
pub type MethodFuture = Pin<Box<dyn Future<Output = Result<Value, Fault>> + Send>>;

/// A leaf callable in the registry.
pub type Method = Arc<dyn Fn(Vec<Value>) -> MethodFuture + Send + Sync>;

enum Member {
    Module(Registry),
    Method(Method),
}

/// String-keyed tree of modules and methods.
#[derive(Default)]
pub struct Registry {
    members: HashMap<String, Member>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            members: HashMap::new(),
        }
    }

    /// Nests a named module built by `build`.
    pub fn module(mut self, name: &str, build: impl FnOnce(Registry) -> Registry) -> Self {
        self.members
            .insert(name.to_string(), Member::Module(build(Registry::new())));
        self
    }

    /// Registers a method under `name`.
    pub fn method<F, Fut>(mut self, name: &str, method: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, Fault>> + Send + 'static,
    {
        let method: Method = Arc::new(move |args| -> MethodFuture { Box::pin(method(args)) });
        self.members.insert(name.to_string(), Member::Method(method));
        self
    }

    /// Walks `path` to a callable. A miss at any depth is an
    /// unreachable-path fault for the peer, not a local error.
    pub fn resolve(&self, path: &[String]) -> Result<Method, Fault> {
        let Some((last, modules)) = path.split_last() else {
            return Err(Fault::unreachable(path));
        };
        let mut node = self;
        for name in modules {
            match node.members.get(name) {
                Some(Member::Module(module)) => node = module,
                _ => return Err(Fault::unreachable(path)),
            }
        }
        match node.members.get(last) {
            Some(Member::Method(method)) => Ok(method.clone()),
            _ => Err(Fault::unreachable(path)),
        }
    }
}
