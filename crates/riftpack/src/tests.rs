// File: crates/riftpack/src/tests.rs
use crate::*;

use std::collections::BTreeMap;

/// Helper to roundtrip a value through the codec and assert structural equality.
fn assert_roundtrip(value: Value) {
    let restored = deserialize(serialize(value.clone()));
    assert_eq!(value, restored);
}

fn locator(raw: &str) -> Value {
    Value::Locator(Url::parse(raw).expect("test locator must parse"))
}

// ============================================================================
//  1. ROUND-TRIP LAW
// ============================================================================

#[test]
fn test_roundtrip_primitives() {
    assert_roundtrip(Value::Null);
    assert_roundtrip(Value::Bool(true));
    assert_roundtrip(Value::Bool(false));
    assert_roundtrip(Value::Int(i64::MIN));
    assert_roundtrip(Value::Int(i64::MAX));
    assert_roundtrip(Value::Float(2.5));
    assert_roundtrip(Value::text(""));
    assert_roundtrip(Value::text("hello"));
}

#[test]
fn test_roundtrip_lists() {
    assert_roundtrip(Value::list([]));
    assert_roundtrip(Value::list([Value::Int(1), Value::text("two"), Value::Null]));
    assert_roundtrip(Value::list([Value::list([Value::list([Value::Bool(true)])])]));
}

#[test]
fn test_roundtrip_records() {
    assert_roundtrip(Value::Record(BTreeMap::new()));
    assert_roundtrip(Value::record([
        ("a", Value::Int(1)),
        ("b", Value::list([Value::text("x")])),
        ("c", Value::record([("nested", Value::Null)])),
    ]));
}

#[test]
fn test_roundtrip_locator() {
    assert_roundtrip(locator("https://example.org/assets/map.json"));
}

#[test]
fn test_roundtrip_locator_nested_deep() {
    assert_roundtrip(Value::record([(
        "resources",
        Value::list([
            Value::record([
                ("name", Value::text("tiles")),
                ("at", locator("https://example.org/tiles.png?v=3")),
            ]),
            locator("file:///var/data/cache.bin"),
        ]),
    )]));
}

// ============================================================================
//  2. LOCATOR TAGGING SHAPE
// ============================================================================

#[test]
fn test_serialize_tags_locator_as_record() {
    let wire = serialize(locator("https://example.org/a"));
    let entries = wire.as_record().expect("locator must serialize to a record");
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries.get(LOCATOR_KEY).and_then(Value::as_text),
        Some("https://example.org/a")
    );
}

#[test]
fn test_deserialize_restores_tagged_record() {
    let wire = Value::record([(LOCATOR_KEY, Value::text("https://example.org/b"))]);
    match deserialize(wire) {
        Value::Locator(url) => assert_eq!(url.as_str(), "https://example.org/b"),
        other => panic!("Expected Locator, got {:?}", other),
    }
}

#[test]
fn test_tagged_record_with_unparseable_text_stays_a_record() {
    let wire = Value::record([(LOCATOR_KEY, Value::text("not a url"))]);
    let restored = deserialize(wire.clone());
    assert_eq!(wire, restored);
}

#[test]
fn test_record_with_extra_keys_is_not_a_locator() {
    let wire = Value::record([
        (LOCATOR_KEY, Value::text("https://example.org/c")),
        ("other", Value::Int(1)),
    ]);
    let restored = deserialize(wire.clone());
    assert_eq!(wire, restored);
}

#[test]
fn test_locator_tag_with_non_text_payload_stays_a_record() {
    let wire = Value::record([(LOCATOR_KEY, Value::Int(7))]);
    let restored = deserialize(wire.clone());
    assert_eq!(wire, restored);
}

// ============================================================================
//  3. OPAQUE PASSTHROUGH
// ============================================================================

#[test]
fn test_opaque_passes_through_unchanged() {
    let opaque = Opaque::new(vec![1u8, 2, 3]);
    let value = Value::Opaque(opaque.clone());

    let wire = serialize(value.clone());
    assert_eq!(wire, value);

    let restored = deserialize(wire);
    match restored {
        Value::Opaque(inner) => {
            assert_eq!(inner, opaque);
            assert_eq!(inner.downcast_ref::<Vec<u8>>(), Some(&vec![1u8, 2, 3]));
        }
        other => panic!("Expected Opaque, got {:?}", other),
    }
}

#[test]
fn test_opaque_equality_is_pointer_identity() {
    let a = Opaque::new(42i64);
    let b = Opaque::new(42i64);
    assert_eq!(a, a.clone());
    assert_ne!(a, b);
}

#[test]
fn test_opaque_inside_record_survives_the_walk() {
    let opaque = Opaque::new("payload".to_string());
    let value = Value::record([("blob", Value::Opaque(opaque.clone()))]);
    let walked = deserialize(serialize(value));
    let entries = walked.as_record().expect("record shape preserved");
    match entries.get("blob") {
        Some(Value::Opaque(inner)) => assert_eq!(*inner, opaque),
        other => panic!("Expected Opaque, got {:?}", other),
    }
}

// ============================================================================
//  4. VALUE HELPERS
// ============================================================================

#[test]
fn test_record_helper_orders_keys() {
    let value = Value::record([("b", Value::Int(2)), ("a", Value::Int(1))]);
    let entries = value.as_record().unwrap();
    let keys: Vec<&str> = entries.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["a", "b"]);
}

#[test]
fn test_accessors() {
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert_eq!(Value::Int(3).as_int(), Some(3));
    assert_eq!(Value::text("t").as_text(), Some("t"));
    assert_eq!(Value::Null.as_text(), None);
    assert!(Value::list([]).as_list().is_some());
    assert!(Value::Record(BTreeMap::new()).as_record().is_some());

    let mut entries = BTreeMap::new();
    entries.insert("k".to_string(), Value::Null);
    assert_eq!(Value::Record(entries).as_int(), None);
}
