//! # Pane Bridge
//!
//! The concrete in-process transport. Each `Pane` stands for one isolated
//! context; a `PaneHub` joins two of them, listening on one and sending to
//! the other. Posting into a pane reaches every listener started on it;
//! posting before any listener exists quietly drops the message. That is
//! the condition the session's handshake retransmission exists to survive.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use riftpack::Value;
use tokio::sync::broadcast;

use crate::transport;
use crate::transport::InboundHandler;
use crate::transport::MessageHub;
use crate::transport::Port;

/// Buffered values per pane inbox before slow listeners start lagging.
const INBOX_CAPACITY: usize = 256;

static NEXT_PANE_ID: AtomicU64 = AtomicU64::new(1);

/// One isolated context endpoint.
#[derive(Clone)]
pub struct Pane {
    id: u64,
    name: String,
    inbox: broadcast::Sender<Value>,
}

impl Pane {
    pub fn new(name: impl Into<String>) -> Self {
        let (inbox, _) = broadcast::channel(INBOX_CAPACITY);
        Self {
            id: NEXT_PANE_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            inbox,
        }
    }

    /// Diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Observes every value delivered to this pane, independently of any
    /// started listener.
    pub fn tap(&self) -> broadcast::Receiver<Value> {
        self.inbox.subscribe()
    }
}

/// [`MessageHub`] joining two distinct panes: listen on `input`, send to
/// `output`.
pub struct PaneHub {
    input: Pane,
    output: Pane,
}

impl PaneHub {
    /// Resolves both endpoints. Fails fast if they are the same pane: a
    /// channel to oneself cannot represent two distinct contexts.
    pub fn connect(input: &Pane, output: &Pane) -> transport::Result<Self> {
        if input.id == output.id {
            return Err(transport::Error::LoopbackEndpoint(input.name.clone()));
        }
        Ok(Self {
            input: input.clone(),
            output: output.clone(),
        })
    }

    /// Two hubs joining `a` and `b` in both directions.
    pub fn pair(a: &Pane, b: &Pane) -> transport::Result<(Self, Self)> {
        Ok((Self::connect(a, b)?, Self::connect(b, a)?))
    }
}

#[async_trait::async_trait]
impl MessageHub for PaneHub {
    async fn start(&self, handler: InboundHandler) -> transport::Result<Port> {
        let mut inbound = self.input.inbox.subscribe();
        let pane = self.input.name.clone();
        let listener = tokio::spawn(async move {
            loop {
                match inbound.recv().await {
                    Ok(content) => handler(content),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(pane = %pane, missed, "listener lagged, values dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let outbox = self.output.inbox.clone();
        let peer = self.output.name.clone();
        Ok(Port::new(
            move |content| {
                if outbox.send(content).is_err() {
                    tracing::trace!(pane = %peer, "no listener on peer pane, value dropped");
                }
            },
            listener,
        ))
    }
}
