//! # Wire Envelope
//!
//! The tagged message shape both peers exchange: a marker plus an exchange
//! id, and exactly one of four kinds (ping, request, response, error).
//!
//! ## Invariants
//!
//! - Decoding never panics on unknown data.
//! - A value without the marker or id is foreign traffic, distinguished
//!   from a marked envelope whose body is malformed: only the latter can be
//!   attributed to an exchange id.

use std::collections::BTreeMap;
use std::fmt;

use riftpack::Value;

use crate::fault::Fault;

/// Well-known id reserved for the handshake exchange.
pub const HANDSHAKE_ID: &str = "handshake";

/// A path-addressed invocation: `path` names the remote member, `args` its
/// arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct Invoke {
    pub path: Vec<String>,
    pub args: Vec<Value>,
}

/// The four message kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Ping,
    Request(Invoke),
    Response(Value),
    Error(Fault),
}

/// One envelope on the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub id: String,
    pub body: Body,
}

/// Why an inbound value failed to decode as a [`Message`].
#[derive(Clone, Debug, PartialEq)]
pub enum DecodeError {
    /// Not an envelope at all: foreign traffic sharing the channel.
    Foreign,
    /// Marked as an envelope, but the rest is unrecognized. The exchange
    /// it names can be terminated.
    Invalid { id: String, reason: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Foreign => write!(f, "foreign traffic, not an envelope"),
            Self::Invalid { id, reason } => {
                write!(f, "invalid envelope for exchange '{}': {}", id, reason)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl Message {
    pub fn ping(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: Body::Ping,
        }
    }

    pub fn request(id: impl Into<String>, invoke: Invoke) -> Self {
        Self {
            id: id.into(),
            body: Body::Request(invoke),
        }
    }

    pub fn response(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            body: Body::Response(body),
        }
    }

    pub fn error(id: impl Into<String>, fault: Fault) -> Self {
        Self {
            id: id.into(),
            body: Body::Error(fault),
        }
    }

    /// Encodes this envelope onto the channel.
    pub fn encode(self) -> Value {
        let mut envelope = BTreeMap::new();
        envelope.insert("marker".to_string(), Value::Bool(true));
        envelope.insert("id".to_string(), Value::Text(self.id));

        match self.body {
            Body::Ping => {
                envelope.insert("kind".to_string(), Value::text("ping"));
            }
            Body::Request(invoke) => {
                envelope.insert("kind".to_string(), Value::text("request"));
                envelope.insert("body".to_string(), encode_invoke(invoke));
            }
            Body::Response(body) => {
                envelope.insert("kind".to_string(), Value::text("response"));
                envelope.insert("body".to_string(), body);
            }
            Body::Error(fault) => {
                envelope.insert("kind".to_string(), Value::text("error"));
                envelope.insert("error".to_string(), fault.encode());
            }
        }

        Value::Record(envelope)
    }

    /// Decodes an inbound value.
    pub fn decode(value: Value) -> Result<Message, DecodeError> {
        let Value::Record(mut entries) = value else {
            return Err(DecodeError::Foreign);
        };
        if entries.get("marker") != Some(&Value::Bool(true)) {
            return Err(DecodeError::Foreign);
        }
        let Some(Value::Text(id)) = entries.remove("id") else {
            return Err(DecodeError::Foreign);
        };

        let kind = match entries.remove("kind") {
            Some(Value::Text(kind)) => kind,
            _ => {
                return Err(DecodeError::Invalid {
                    id,
                    reason: "missing kind".to_string(),
                })
            }
        };

        let body = match kind.as_str() {
            "ping" => Body::Ping,
            "request" => match decode_invoke(entries.remove("body")) {
                Ok(invoke) => Body::Request(invoke),
                Err(reason) => return Err(DecodeError::Invalid { id, reason }),
            },
            "response" => Body::Response(entries.remove("body").unwrap_or(Value::Null)),
            "error" => Body::Error(Fault::decode(entries.remove("error").unwrap_or(Value::Null))),
            other => {
                return Err(DecodeError::Invalid {
                    id,
                    reason: format!("unknown kind `{}`", other),
                })
            }
        };

        Ok(Message { id, body })
    }
}

fn encode_invoke(invoke: Invoke) -> Value {
    let mut body = BTreeMap::new();
    body.insert("call".to_string(), Value::text("invoke"));
    body.insert(
        "path".to_string(),
        Value::List(invoke.path.into_iter().map(Value::Text).collect()),
    );
    body.insert("args".to_string(), Value::List(invoke.args));
    Value::Record(body)
}

fn decode_invoke(body: Option<Value>) -> Result<Invoke, String> {
    let Some(Value::Record(mut body)) = body else {
        return Err("request body is not a record".to_string());
    };
    match body.remove("call") {
        Some(Value::Text(call)) if call == "invoke" => {}
        _ => return Err("request body is not an invoke".to_string()),
    }

    let path = match body.remove("path") {
        Some(Value::List(members)) => {
            let mut path = Vec::with_capacity(members.len());
            for member in members {
                match member {
                    Value::Text(member) => path.push(member),
                    _ => return Err("path member is not text".to_string()),
                }
            }
            path
        }
        _ => return Err("missing path".to_string()),
    };

    let args = match body.remove("args") {
        Some(Value::List(args)) => args,
        _ => return Err("missing args".to_string()),
    };

    Ok(Invoke { path, args })
}
