//! # Invoke Capture
//!
//! Turns chained member access plus a final invocation into a single
//! `(path, args)` pair, with no schema declared on the calling side:
//! `remote.at("store").at("get").call(args)` submits
//! `(["store", "get"], args)`.

use std::sync::Arc;

use riftpack::Value;

use crate::deferred::Wait;

/// The generic call seam the capture feeds. The protocol layer needs
/// nothing more than `(path, args) -> wait`.
pub trait InvokeSink: Send + Sync + 'static {
    fn submit(&self, path: Vec<String>, args: Vec<Value>) -> Wait<Value>;
}

/// A call-capturing handle addressing one remote member.
#[derive(Clone)]
pub struct Capture {
    sink: Arc<dyn InvokeSink>,
    path: Vec<String>,
}

impl Capture {
    /// The root capture, addressing the remote surface itself.
    pub fn root(sink: Arc<dyn InvokeSink>) -> Self {
        Self {
            sink,
            path: Vec::new(),
        }
    }

    /// A new capture addressing the member `name` of this one. The parent
    /// is left untouched.
    ///
    /// # Panics
    ///
    /// An empty member name is a programming error and panics.
    pub fn at(&self, name: &str) -> Capture {
        assert!(!name.is_empty(), "remote member name must not be empty");
        let mut path = self.path.clone();
        path.push(name.to_string());
        Capture {
            sink: self.sink.clone(),
            path,
        }
    }

    /// Invokes the addressed member, submitting the captured path and the
    /// argument list to the sink exactly once.
    pub fn call(&self, args: Vec<Value>) -> Wait<Value> {
        self.sink.submit(self.path.clone(), args)
    }

    /// The member path this capture addresses.
    pub fn path(&self) -> &[String] {
        &self.path
    }
}
