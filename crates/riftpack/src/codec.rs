//! # Structural Serialization
//!
//! A recursive structural copy that tags the one non-plain value kind
//! (URL locators) so it survives a channel that clones only plain data.
//!
//! ## Invariants
//!
//! - `deserialize(serialize(v))` is structurally equal to `v` for any value
//!   built from primitives, lists, records, and locators, at arbitrary
//!   nesting depth.
//! - `Opaque` values pass through both directions untouched.

use std::collections::BTreeMap;

use url::Url;

use crate::value::Value;

/// Key of the tagged record a locator becomes on the wire.
pub const LOCATOR_KEY: &str = "locator";

/// Prepares a value for the channel.
///
/// Primitives and opaque values pass through; lists map element-wise;
/// records copy key-by-key, recursing; a locator becomes the tagged record
/// `{"locator": <absolute string form>}`.
pub fn serialize(value: Value) -> Value {
    match value {
        Value::List(items) => Value::List(items.into_iter().map(serialize).collect()),
        Value::Record(entries) => Value::Record(
            entries
                .into_iter()
                .map(|(key, value)| (key, serialize(value)))
                .collect(),
        ),
        Value::Locator(url) => {
            let mut tagged = BTreeMap::new();
            tagged.insert(LOCATOR_KEY.to_string(), Value::Text(url.to_string()));
            Value::Record(tagged)
        }
        other => other,
    }
}

/// Restores a value received from the channel. Exact mirror of [`serialize`].
pub fn deserialize(value: Value) -> Value {
    match value {
        Value::List(items) => Value::List(items.into_iter().map(deserialize).collect()),
        Value::Record(entries) => {
            if let Some(url) = locator_from(&entries) {
                return Value::Locator(url);
            }
            Value::Record(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, deserialize(value)))
                    .collect(),
            )
        }
        other => other,
    }
}

/// Recognizes the tagged locator record: exactly one key, [`LOCATOR_KEY`],
/// holding text that parses as an absolute URL.
fn locator_from(entries: &BTreeMap<String, Value>) -> Option<Url> {
    if entries.len() != 1 {
        return None;
    }
    match entries.get(LOCATOR_KEY)? {
        Value::Text(raw) => Url::parse(raw).ok(),
        _ => None,
    }
}
