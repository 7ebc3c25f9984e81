// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

crate::define_id! {
    /// Test-only ID type.
    pub struct TestId("test-");
}

#[test]
fn generated_ids_carry_prefix_and_length() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("test-"));
    assert_eq!(id.as_str().len(), ID_MAX_LEN);
}

#[test]
fn generated_ids_are_unique() {
    let a = TestId::new();
    let b = TestId::new();
    assert_ne!(a, b);
}

#[test]
fn suffix_strips_prefix() {
    let id = TestId::from_string("test-abc123");
    assert_eq!(id.suffix(), "abc123");
    assert_eq!(id.short(3), "abc");
}

#[test]
fn short_clamps_to_suffix_length() {
    let id = TestId::from_string("test-ab");
    assert_eq!(id.short(10), "ab");
}

#[test]
fn id_serde_round_trip() {
    let id = TestId::from_string("test-roundtrip");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"test-roundtrip\"");

    let parsed: TestId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn deserialize_rejects_oversized_ids() {
    let long = format!("\"{}\"", "x".repeat(ID_MAX_LEN + 1));
    let result: Result<TestId, _> = serde_json::from_str(&long);
    assert!(result.is_err());
}

#[test]
fn idbuf_hash_matches_str_lookup() {
    use std::collections::HashMap;

    let id = TestId::from_string("test-key");
    let mut map: HashMap<TestId, u32> = HashMap::new();
    map.insert(id, 7);
    assert_eq!(map.get("test-key"), Some(&7));
}
