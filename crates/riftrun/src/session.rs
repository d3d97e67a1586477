//! # RPC Session
//!
//! Wires the task pool, the invoke capture, and a transport into the full
//! protocol: a ping handshake that detects when the peer is actually
//! listening, outbound call dispatch correlated by id, and inbound request
//! servicing against the local registry.
//!
//! ## Invariants
//!
//! - No application request leaves before the handshake settles.
//! - Every inbound failure attributable to an id reaches only that id's
//!   future; foreign traffic is dropped without escalation.
//! - `stop()` releases handshake waiters but leaves in-flight calls
//!   unsettled.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use riftpack::Value;
use riftpack::deserialize;
use riftpack::serialize;
use riftrpc::Body;
use riftrpc::DecodeError;
use riftrpc::Fault;
use riftrpc::HANDSHAKE_ID;
use riftrpc::Invoke;
use riftrpc::Message;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::capture::Capture;
use crate::capture::InvokeSink;
use crate::deferred::Deferred;
use crate::deferred::Wait;
use crate::pool::TaskPool;
use crate::registry::Registry;
use crate::transport;
use crate::transport::InboundHandler;
use crate::transport::MessageHub;
use crate::transport::Port;

/// Tunables for one session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Fixed interval between handshake pings. Unconditional, no backoff:
    /// re-sending is the liveness mechanism while the peer's listener may
    /// not exist yet.
    pub heartbeat: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat: Duration::from_millis(500),
        }
    }
}

/// Connection lifecycle. `Stopped` is terminal; there is no return path.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Connected,
    Stopped,
}

/// One endpoint of a remote-invocation connection.
///
/// A session carries no process-wide state; instantiate one per connection.
pub struct Session {
    shared: Arc<Shared>,
}

struct Shared {
    pool: TaskPool,
    registry: Registry,
    port: Port,
    handshake: Wait<Value>,
    peer_seen: AtomicBool,
    stopped: AtomicBool,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Opens a session over `hub`, exposing `registry` to the peer.
    ///
    /// Reserves the handshake task, registers the inbound listener, and
    /// begins retransmitting `Ping` until the peer answers.
    pub async fn start(
        hub: &dyn MessageHub,
        registry: Registry,
        config: SessionConfig,
    ) -> transport::Result<Session> {
        let pool = TaskPool::new();
        let (_, handshake) = pool.create(Some(HANDSHAKE_ID));

        let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
        let handler: InboundHandler = Arc::new(move |content| {
            let _ = inbound_tx.send(content);
        });
        let port = hub.start(handler).await?;

        let shared = Arc::new(Shared {
            pool,
            registry,
            port,
            handshake,
            peer_seen: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            heartbeat: Mutex::new(None),
        });

        let beat_shared = shared.clone();
        let heartbeat = tokio::spawn(async move {
            let mut tick = tokio::time::interval(config.heartbeat);
            loop {
                tick.tick().await;
                beat_shared.port.post(Message::ping(HANDSHAKE_ID).encode());
            }
        });
        if let Ok(mut slot) = shared.heartbeat.lock() {
            *slot = Some(heartbeat);
        }

        // Inbound dispatch starts only after the heartbeat handle is
        // stored: a ping answered earlier could leave the heartbeat
        // running with no way to stop it.
        let pump_shared = shared.clone();
        tokio::spawn(async move {
            while let Some(content) = inbound_rx.recv().await {
                pump_shared.dispatch(content);
            }
        });

        Ok(Session { shared })
    }

    /// The remote surface: chained member access plus invocation, e.g.
    /// `session.remote().at("store").at("get").call(args)`.
    pub fn remote(&self) -> Capture {
        Capture::root(Arc::new(SessionSink {
            shared: self.shared.clone(),
        }))
    }

    /// The handshake future: settles once the peer is known to listen.
    pub fn ready(&self) -> Wait<Value> {
        self.shared.handshake.clone()
    }

    pub fn state(&self) -> SessionState {
        if self.shared.stopped.load(Ordering::SeqCst) {
            SessionState::Stopped
        } else if self.shared.handshake.is_settled() {
            SessionState::Connected
        } else {
            SessionState::Connecting
        }
    }

    /// Stops retransmission, detaches the listener, and releases anyone
    /// still awaiting the handshake. Idempotent. In-flight calls are not
    /// aborted; their futures never settle once the listener is gone.
    pub fn stop(&self) {
        if self.shared.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.stop_heartbeat();
        self.shared.port.stop();
        if self.shared.pool.contains(HANDSHAKE_ID) {
            self.shared.pool.abort(
                HANDSHAKE_ID,
                Fault::cancelled("session stopped before the peer answered"),
            );
        }
    }
}

impl Shared {
    fn dispatch(self: &Arc<Self>, content: Value) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        let message = match Message::decode(content) {
            Ok(message) => message,
            Err(DecodeError::Foreign) => {
                tracing::trace!("foreign traffic on channel, dropping");
                return;
            }
            Err(DecodeError::Invalid { id, reason }) => {
                tracing::debug!(id, reason, "malformed envelope, rejecting exchange");
                self.pool.abort(&id, Fault::protocol(reason));
                return;
            }
        };
        match message.body {
            Body::Ping => self.on_ping(),
            Body::Request(invoke) => {
                let shared = self.clone();
                tokio::spawn(async move { shared.serve(message.id, invoke).await });
            }
            Body::Response(body) => self.pool.done(&message.id, deserialize(body)),
            Body::Error(fault) => self.pool.abort(&message.id, fault),
        }
    }

    /// First peer ping: answer once so a simultaneous start still
    /// converges, stop retransmitting, and mark the connection live.
    /// Every later ping is ignored.
    fn on_ping(&self) {
        if self.peer_seen.swap(true, Ordering::SeqCst) {
            return;
        }
        self.port.post(Message::ping(HANDSHAKE_ID).encode());
        self.stop_heartbeat();
        self.pool.done(HANDSHAKE_ID, Value::Null);
    }

    /// Services one inbound request and always posts a terminal answer:
    /// a response on success, an error envelope on any failure, including
    /// a path that resolves to nothing.
    async fn serve(&self, id: String, invoke: Invoke) {
        let args: Vec<Value> = invoke.args.into_iter().map(deserialize).collect();
        let outcome = match self.registry.resolve(&invoke.path) {
            Ok(method) => method(args).await,
            Err(fault) => Err(fault),
        };
        let reply = match outcome {
            Ok(value) => Message::response(id, serialize(value)),
            Err(fault) => Message::error(id, fault),
        };
        self.port.post(reply.encode());
    }

    fn stop_heartbeat(&self) {
        if let Ok(mut slot) = self.heartbeat.lock() {
            if let Some(task) = slot.take() {
                task.abort();
            }
        }
    }
}

/// The session-backed sink behind [`Session::remote`].
struct SessionSink {
    shared: Arc<Shared>,
}

impl InvokeSink for SessionSink {
    /// Holds the call until the connection is established, then allocates
    /// a fresh task, posts exactly one request, and relays the task's
    /// outcome. A handshake abort (via `stop`) aborts the call instead.
    fn submit(&self, path: Vec<String>, args: Vec<Value>) -> Wait<Value> {
        let relay = Deferred::new();
        let wait = relay.wait();
        let shared = self.shared.clone();
        tokio::spawn(async move {
            if let Err(fault) = shared.handshake.clone().recv().await {
                relay.abort(fault);
                return;
            }
            let (id, pending) = shared.pool.create(None);
            let args = args.into_iter().map(serialize).collect();
            shared.port.post(Message::request(id, Invoke { path, args }).encode());
            match pending.recv().await {
                Ok(value) => relay.done(value),
                Err(fault) => relay.abort(fault),
            };
        });
        wait
    }
}
