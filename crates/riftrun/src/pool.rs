//! # Task Pool
//!
//! Id-keyed registry of calls awaiting a reply. Outbound dispatch inserts
//! an entry; inbound replies settle it by id. Correlation relies on ids
//! alone, never on arrival order.
//!
//! ## Invariants
//!
//! - Generated ids are collision-resistant random tokens: two independently
//!   started peers must never collide.
//! - Settling removes the entry, so the pool stays bounded by the number of
//!   calls actually in flight.
//! - A reply for an unknown id is a logged no-op and must never disturb
//!   other pending tasks.

use dashmap::DashMap;
use riftpack::Value;
use riftrpc::Fault;

use crate::deferred::Deferred;
use crate::deferred::Wait;

/// Pending exchanges keyed by message id.
pub struct TaskPool {
    tasks: DashMap<String, Deferred<Value>>,
}

impl TaskPool {
    pub fn new() -> Self {
        Self {
            tasks: DashMap::new(),
        }
    }

    /// Registers a new pending task and returns its id and future.
    ///
    /// A generated id is a random 128-bit token; an explicit id is reserved
    /// for the handshake exchange.
    pub fn create(&self, explicit: Option<&str>) -> (String, Wait<Value>) {
        let id = match explicit {
            Some(id) => id.to_string(),
            None => format!("{:032x}", rand::random::<u128>()),
        };
        let task = Deferred::new();
        let wait = task.wait();
        self.tasks.insert(id.clone(), task);
        (id, wait)
    }

    /// Settles the task for `id` with a success value.
    pub fn done(&self, id: &str, value: Value) {
        let Some((_, task)) = self.tasks.remove(id) else {
            tracing::debug!(id, "response for unknown task id, ignoring");
            return;
        };
        task.done(value);
    }

    /// Settles the task for `id` with a failure.
    pub fn abort(&self, id: &str, fault: Fault) {
        let Some((_, task)) = self.tasks.remove(id) else {
            tracing::debug!(id, fault = %fault, "error for unknown task id, ignoring");
            return;
        };
        task.abort(fault);
    }

    /// Whether `id` is still awaiting a reply.
    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new()
    }
}
