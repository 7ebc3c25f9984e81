// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn session_ids_use_sess_prefix() {
    let id = SessionId::new();
    assert!(id.as_str().starts_with("sess-"));
}

#[test]
fn session_id_display_and_eq() {
    let id = SessionId::from_string("sess-abc");
    assert_eq!(id.to_string(), "sess-abc");
    assert_eq!(id, "sess-abc");
}

#[test]
fn session_id_serde() {
    let id = SessionId::from_string("sess-xyz");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"sess-xyz\"");

    let parsed: SessionId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}
