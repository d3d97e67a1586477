//! # Fault Envelope
//!
//! The serializable shape a failure takes when crossing the channel.
//!
//! ## Invariants
//!
//! - Decoding never fails: an unrecognized error payload becomes an `App`
//!   fault carrying a rendered form of the payload, so foreign errors still
//!   surface as rejections.

use std::collections::BTreeMap;
use std::fmt;

use riftpack::Value;

/// Classification of a failure attributed to one exchange.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FaultKind {
    /// The servicing implementation failed or rejected.
    App,
    /// The requested path did not resolve to a callable.
    Unreachable,
    /// The message structure itself was malformed.
    Protocol,
    /// The exchange was abandoned locally before an answer arrived.
    Cancelled,
}

impl FaultKind {
    fn as_tag(self) -> &'static str {
        match self {
            FaultKind::App => "app",
            FaultKind::Unreachable => "unreachable",
            FaultKind::Protocol => "protocol",
            FaultKind::Cancelled => "cancelled",
        }
    }

    fn from_tag(tag: &str) -> Option<FaultKind> {
        match tag {
            "app" => Some(FaultKind::App),
            "unreachable" => Some(FaultKind::Unreachable),
            "protocol" => Some(FaultKind::Protocol),
            "cancelled" => Some(FaultKind::Cancelled),
            _ => None,
        }
    }
}

/// A failure attributed to one exchange.
#[derive(Clone, Debug, PartialEq)]
pub struct Fault {
    pub kind: FaultKind,
    pub message: String,
    pub detail: Option<Value>,
}

impl Fault {
    pub fn app(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::App,
            message: message.into(),
            detail: None,
        }
    }

    pub fn unreachable(path: &[String]) -> Self {
        Self {
            kind: FaultKind::Unreachable,
            message: format!("no callable at `{}`", path.join(".")),
            detail: None,
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Protocol,
            message: message.into(),
            detail: None,
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Cancelled,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// The wire form: `{"kind", "message", "detail"?}`.
    pub fn encode(self) -> Value {
        let mut entries = BTreeMap::new();
        entries.insert("kind".to_string(), Value::text(self.kind.as_tag()));
        entries.insert("message".to_string(), Value::Text(self.message));
        if let Some(detail) = self.detail {
            entries.insert("detail".to_string(), detail);
        }
        Value::Record(entries)
    }

    /// Reads a fault back from an error payload.
    ///
    /// Payloads that are not the `encode` shape are folded into an `App`
    /// fault rather than rejected.
    pub fn decode(value: Value) -> Fault {
        if let Value::Record(mut entries) = value {
            let kind = match entries.get("kind").and_then(Value::as_text) {
                Some(tag) => FaultKind::from_tag(tag),
                None => None,
            };
            let message = entries
                .get("message")
                .and_then(Value::as_text)
                .map(str::to_string);
            if let (Some(kind), Some(message)) = (kind, message) {
                return Fault {
                    kind,
                    message,
                    detail: entries.remove("detail"),
                };
            }
            return Fault::app(render(&Value::Record(entries)));
        }
        Fault::app(render(&value))
    }
}

/// A readable form for payloads that are not fault envelopes.
fn render(value: &Value) -> String {
    match value {
        Value::Text(text) => text.clone(),
        other => format!("{:?}", other),
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_tag(), self.message)
    }
}

impl std::error::Error for Fault {}
