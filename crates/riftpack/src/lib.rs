// crates/riftpack/src/lib.rs
//! Structural value model and serialization for data crossing a message channel.

mod codec;
mod value;

#[cfg(test)]
mod tests;

pub use url::Url;

pub use crate::value::Opaque;
pub use crate::value::Value;

pub use crate::codec::deserialize;
pub use crate::codec::serialize;
pub use crate::codec::LOCATOR_KEY;
