// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Duration;
use relay_core::SourceBreakpoint;

fn snapshot(id: &str) -> PersistedSession {
    let now = Utc::now();
    PersistedSession {
        id: SessionId::from_string(id),
        name: format!("session-{id}"),
        project_root: "/work/project".to_string(),
        state: "paused".to_string(),
        language: "python".to_string(),
        created_at: now,
        last_activity: now,
        breakpoints: HashMap::from([(
            "/work/app.py".to_string(),
            vec![SourceBreakpoint::new(4).condition("i == 5")],
        )]),
        watch_expressions: vec!["total".to_string(), "len(items)".to_string()],
        saved_at: now,
        server_shutdown: false,
    }
}

#[tokio::test]
async fn save_load_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let store = SessionStore::new(dir.path());

    let session = snapshot("sess-round");
    store.save(&session).await.expect("save failed");

    let loaded = store.load(&session.id).await.expect("load failed").expect("missing");
    assert_eq!(loaded, session);
}

#[tokio::test]
async fn load_missing_is_none() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let store = SessionStore::new(dir.path());
    let loaded = store.load(&SessionId::from_string("sess-none")).await.expect("load failed");
    assert!(loaded.is_none());
}

#[tokio::test]
async fn timestamps_are_iso_8601_strings_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let store = SessionStore::new(dir.path());

    let session = snapshot("sess-iso");
    store.save(&session).await.expect("save failed");

    let path = dir.path().join("sess-iso.json");
    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(path).expect("read failed")).expect("parse failed");
    let saved_at = raw["saved_at"].as_str().expect("saved_at not a string");
    assert!(saved_at.contains('T'), "not ISO-8601: {saved_at}");
    assert_eq!(raw["server_shutdown"], false);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let store = SessionStore::new(dir.path());

    let session = snapshot("sess-del");
    store.save(&session).await.expect("save failed");

    assert!(store.delete(&session.id).await);
    assert!(!store.delete(&session.id).await);
    assert!(store.load(&session.id).await.expect("load failed").is_none());
}

#[tokio::test]
async fn list_all_skips_poisoned_files() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let store = SessionStore::new(dir.path());

    store.save(&snapshot("sess-good")).await.expect("save failed");
    tokio::fs::write(dir.path().join("sess-bad.json"), b"{ nope")
        .await
        .expect("write failed");

    let sessions = store.list_all().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, "sess-good");
}

#[tokio::test]
async fn cleanup_old_removes_only_stale_snapshots() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let store = SessionStore::new(dir.path());

    let fresh = snapshot("sess-fresh");
    let mut stale = snapshot("sess-stale");
    stale.saved_at = Utc::now() - Duration::hours(30);

    store.save(&fresh).await.expect("save failed");
    store.save(&stale).await.expect("save failed");

    let cleaned = store.cleanup_old(24).await;
    assert_eq!(cleaned, 1);

    let remaining = store.list_all().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "sess-fresh");
}

#[tokio::test]
async fn language_defaults_when_missing_from_old_snapshots() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let store = SessionStore::new(dir.path());

    let now = Utc::now().to_rfc3339();
    let legacy = serde_json::json!({
        "id": "sess-legacy",
        "name": "old",
        "project_root": "/work",
        "state": "created",
        "created_at": now,
        "last_activity": now,
        "breakpoints": {},
        "saved_at": now,
    });
    tokio::fs::write(
        dir.path().join("sess-legacy.json"),
        serde_json::to_vec(&legacy).expect("encode failed"),
    )
    .await
    .expect("write failed");

    let loaded = store
        .load(&SessionId::from_string("sess-legacy"))
        .await
        .expect("load failed")
        .expect("missing");
    assert_eq!(loaded.language, "python");
    assert!(loaded.watch_expressions.is_empty());
    assert!(!loaded.server_shutdown);
}
