//! # Transport Abstraction
//!
//! A minimal interface for moving structured values between two contexts.
//!
//! ## Philosophy
//!
//! - **Value-Oriented**: a hub moves [`Value`] trees. It knows nothing
//!   about envelopes, ids, or the handshake.
//! - **At-Least-Once, Per-Direction FIFO**: after `start`, everything the
//!   peer sends reaches the handler, in the peer's send order. Nothing is
//!   promised across directions.

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;

use riftpack::Value;
use tokio::task::JoinHandle;

/// Errors at the transport layer.
#[derive(Debug, Clone)]
pub enum Error {
    /// Both ends of the channel resolve to the same context.
    LoopbackEndpoint(String),
    /// The underlying channel is gone.
    Closed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoopbackEndpoint(name) => {
                write!(f, "endpoint '{}' cannot connect to itself", name)
            }
            Self::Closed(msg) => write!(f, "channel closed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Receives every inbound value on a started port.
pub type InboundHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// A factory for open channel endpoints.
///
/// Starting a hub twice yields independent ports, each with its own
/// listener lifecycle.
#[async_trait::async_trait]
pub trait MessageHub: Send + Sync + 'static {
    /// Registers `handler` for inbound traffic and returns the open port.
    async fn start(&self, handler: InboundHandler) -> Result<Port>;
}

/// One open channel endpoint: a send capability plus one registered
/// listener. Lifecycle is open → stopped, one-way, non-reusable.
pub struct Port {
    outbound: Box<dyn Fn(Value) + Send + Sync>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Port {
    /// Builds a port from a send capability and the spawned listener task.
    pub fn new(outbound: impl Fn(Value) + Send + Sync + 'static, listener: JoinHandle<()>) -> Self {
        Self {
            outbound: Box::new(outbound),
            listener: Mutex::new(Some(listener)),
        }
    }

    /// Enqueues `content` for delivery to the peer.
    pub fn post(&self, content: Value) {
        (self.outbound)(content);
    }

    /// Detaches the listener. Idempotent; the send capability survives.
    pub fn stop(&self) {
        if let Ok(mut slot) = self.listener.lock() {
            if let Some(listener) = slot.take() {
                listener.abort();
            }
        }
    }
}
