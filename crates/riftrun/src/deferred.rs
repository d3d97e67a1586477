//! # Single-Settle Futures
//!
//! `Deferred` is the unit of suspension: one result, settled at most once,
//! awaited by any number of parties.
//!
//! ## Invariants
//!
//! - The first of `done`/`abort` wins; every later settlement is a no-op.
//! - A `Wait` whose settler is dropped unsettled never completes.

use riftrpc::Fault;
use tokio::sync::watch;

/// The settled result of an exchange.
pub type Outcome<T> = Result<T, Fault>;

/// A single-settle deferred result.
pub struct Deferred<T> {
    slot: watch::Sender<Option<Outcome<T>>>,
}

impl<T: Clone> Deferred<T> {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self { slot }
    }

    /// A waiter on this result. Waiters are independent and cheap; each
    /// observes the one settled outcome.
    pub fn wait(&self) -> Wait<T> {
        Wait {
            slot: self.slot.subscribe(),
        }
    }

    /// Settles with a success value. Returns whether this call won.
    pub fn done(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settles with a failure. Returns whether this call won.
    pub fn abort(&self, fault: Fault) -> bool {
        self.settle(Err(fault))
    }

    fn settle(&self, outcome: Outcome<T>) -> bool {
        self.slot.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome);
            true
        })
    }
}

impl<T: Clone> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle awaiting a [`Deferred`]'s outcome.
#[derive(Clone)]
pub struct Wait<T> {
    slot: watch::Receiver<Option<Outcome<T>>>,
}

impl<T: Clone> Wait<T> {
    /// Resolves once the deferred settles. Never resolves if the settler
    /// is dropped first.
    pub async fn recv(mut self) -> Outcome<T> {
        let settled = match self.slot.wait_for(|slot| slot.is_some()).await {
            Ok(slot) => (*slot).clone(),
            Err(_) => None,
        };
        match settled {
            Some(outcome) => outcome,
            None => std::future::pending().await,
        }
    }

    /// Whether the deferred has already settled.
    pub fn is_settled(&self) -> bool {
        self.slot.borrow().is_some()
    }
}
