// crates/riftrpc/src/lib.rs
//! # RiftRPC
//!
//! The wire envelope for remote invocation between two isolated contexts.
//!
//! ## Architecture
//!
//! The channel carries [`riftpack::Value`] trees; this crate defines the
//! marker-tagged envelope both peers exchange on top of them. Decoding
//! distinguishes foreign traffic (not an envelope at all, to be dropped)
//! from marked envelopes with malformed bodies (attributable to an id, to
//! be answered with a terminal rejection).

mod fault;
mod message;


pub use crate::fault::Fault;
pub use crate::fault::FaultKind;

pub use crate::message::Body;
pub use crate::message::DecodeError;
pub use crate::message::Invoke;
pub use crate::message::Message;
pub use crate::message::HANDSHAKE_ID;
