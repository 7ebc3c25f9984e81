// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recoverable session snapshots.
//!
//! Sessions are persisted periodically for crash recovery and once more
//! during graceful shutdown. On startup the snapshots feed the manager's
//! recoverable catalog; recovery restores configuration (breakpoints and
//! watches), never the debuggee process.

use crate::fs::{atomic_write_json, delete_file, list_json_files, read_json};
use crate::StorageError;
use chrono::{DateTime, Utc};
use relay_core::{SessionId, SourceBreakpoint};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Session snapshot, one JSON file per session id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub id: SessionId,
    pub name: String,
    pub project_root: String,
    /// Last known lifecycle state tag (informational)
    pub state: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub breakpoints: HashMap<String, Vec<SourceBreakpoint>>,
    #[serde(default)]
    pub watch_expressions: Vec<String>,
    pub saved_at: DateTime<Utc>,
    /// True when written during graceful stop, false for periodic snapshots
    #[serde(default)]
    pub server_shutdown: bool,
}

fn default_language() -> String {
    "python".to_string()
}

/// JSON-file catalog of recoverable sessions.
pub struct SessionStore {
    base_dir: PathBuf,
}

impl SessionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn file_path(&self, id: &SessionId) -> PathBuf {
        self.base_dir.join(format!("{id}.json"))
    }

    pub async fn save(&self, session: &PersistedSession) -> Result<(), StorageError> {
        atomic_write_json(&self.file_path(&session.id), session).await?;
        tracing::debug!(session = %session.id, "saved session snapshot");
        Ok(())
    }

    /// Load one snapshot; absent file is `None`, malformed is
    /// `PERSIST_INVALID`.
    pub async fn load(&self, id: &SessionId) -> Result<Option<PersistedSession>, StorageError> {
        read_json(&self.file_path(id)).await
    }

    /// Best-effort delete; false when no snapshot existed.
    pub async fn delete(&self, id: &SessionId) -> bool {
        let deleted = delete_file(&self.file_path(id)).await;
        if deleted {
            tracing::debug!(session = %id, "deleted session snapshot");
        }
        deleted
    }

    /// All parseable snapshots. One poisoned file must not prevent recovery
    /// of the others; unparseable entries are logged and skipped.
    pub async fn list_all(&self) -> Vec<PersistedSession> {
        let mut sessions = Vec::new();
        for path in list_json_files(&self.base_dir).await {
            match read_json::<PersistedSession>(&path).await {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable session snapshot");
                }
            }
        }
        sessions
    }

    /// Delete snapshots older than `max_age_hours`. Returns how many were
    /// removed.
    pub async fn cleanup_old(&self, max_age_hours: i64) -> usize {
        let now = Utc::now();
        let mut cleaned = 0;

        for session in self.list_all().await {
            let age = now.signed_duration_since(session.saved_at);
            if age > chrono::Duration::hours(max_age_hours) {
                if self.delete(&session.id).await {
                    cleaned += 1;
                    tracing::info!(
                        session = %session.id,
                        age_hours = age.num_hours(),
                        "cleaned up old session snapshot"
                    );
                }
            }
        }
        cleaned
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
