// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide session registry: admission, lookup, termination, idle
//! expiry, periodic persistence, and the recovery catalog.

use crate::env::RelayConfig;
use crate::session::{Session, SessionConfig, SessionError};
use chrono::Utc;
use relay_adapters::{AdapterError, AdapterRegistry};
use relay_core::SessionId;
use relay_storage::{BreakpointStore, PersistedSession, SessionStore, StorageError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const PERSIST_INTERVAL: Duration = Duration::from_secs(300);
const RECOVERY_MAX_AGE_HOURS: i64 = 24;

/// Manager-level errors.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("session '{0}' not found")]
    NotFound(SessionId),

    #[error("maximum of {0} concurrent sessions reached")]
    LimitReached(usize),

    #[error("session '{0}' has expired")]
    Expired(SessionId),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ManagerError {
    /// Stable error code surfaced over the external boundary.
    pub fn code(&self) -> &'static str {
        match self {
            ManagerError::NotFound(_) => "SESSION_NOT_FOUND",
            ManagerError::LimitReached(_) => "SESSION_LIMIT_REACHED",
            ManagerError::Expired(_) => "SESSION_EXPIRED",
            ManagerError::Session(e) => e.code(),
            ManagerError::Adapter(e) => e.code(),
            ManagerError::Storage(e) => e.code(),
        }
    }
}

struct Registry {
    sessions: HashMap<SessionId, Arc<Session>>,
    /// Persisted snapshots from a previous run, keyed by session id. A
    /// session id is never simultaneously live and recoverable.
    recoverable: HashMap<SessionId, PersistedSession>,
}

/// Process-wide registry of debug sessions.
pub struct SessionManager {
    config: RelayConfig,
    registry: AdapterRegistry,
    breakpoint_store: BreakpointStore,
    session_store: SessionStore,
    inner: tokio::sync::Mutex<Registry>,
    tasks: parking_lot::Mutex<Vec<JoinHandle<()>>>,
    shutdown: CancellationToken,
}

impl SessionManager {
    pub fn new(config: RelayConfig) -> Self {
        Self::with_registry(config, AdapterRegistry::with_defaults())
    }

    /// Construct with an explicit adapter registry (tests inject fakes).
    pub fn with_registry(config: RelayConfig, registry: AdapterRegistry) -> Self {
        let breakpoint_store = BreakpointStore::new(config.breakpoints_dir());
        let session_store = SessionStore::new(config.sessions_dir());
        Self {
            config,
            registry,
            breakpoint_store,
            session_store,
            inner: tokio::sync::Mutex::new(Registry {
                sessions: HashMap::new(),
                recoverable: HashMap::new(),
            }),
            tasks: parking_lot::Mutex::new(Vec::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Start the manager: load the recovery catalog and spawn the idle
    /// expiry and periodic persistence loops.
    pub async fn start(self: &Arc<Self>) -> Result<(), ManagerError> {
        self.config.ensure_directories().map_err(StorageError::Io)?;
        self.load_recoverable().await;

        let mut tasks = self.tasks.lock();
        tasks.push(tokio::spawn(expiry_loop(Arc::clone(self))));
        tasks.push(tokio::spawn(persist_loop(Arc::clone(self))));
        info!("session manager started");
        Ok(())
    }

    /// Graceful shutdown: cancel background loops, snapshot every live
    /// session with `server_shutdown=true`, persist breakpoints, clean up.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            let _ = task.await;
        }

        let sessions: Vec<Arc<Session>> = {
            let mut inner = self.inner.lock().await;
            inner.sessions.drain().map(|(_, session)| session).collect()
        };
        for session in sessions {
            if let Err(e) = self.session_store.save(&session.to_persisted(true)).await {
                warn!(session = %session.id(), error = %e, "failed to persist session");
            }
            if let Err(e) = self
                .breakpoint_store
                .save(session.project_root(), &session.breakpoints_snapshot())
                .await
            {
                warn!(session = %session.id(), error = %e, "failed to persist breakpoints");
            }
            session.cleanup().await;
        }
        info!("session manager stopped (sessions persisted for recovery)");
    }

    /// Create a session: admission check, adapter construction and
    /// initialize, then pre-load the project's persisted breakpoints.
    ///
    /// The registry lock is never held across adapter startup; admission is
    /// checked narrowly up front and re-checked at insert time.
    pub async fn create(&self, config: SessionConfig) -> Result<Arc<Session>, ManagerError> {
        {
            let inner = self.inner.lock().await;
            if inner.sessions.len() >= self.config.max_sessions {
                return Err(ManagerError::LimitReached(self.config.max_sessions));
            }
        }

        let id = SessionId::new();
        let default_timeout_minutes = self.config.session_idle_timeout.as_secs() / 60;
        let session = Arc::new(Session::new(
            id,
            &config,
            default_timeout_minutes,
            self.config.output_buffer_max_bytes,
        ));
        session.init_adapter(&self.registry, self.config.adapter_settings()).await?;

        match self.breakpoint_store.load(&config.project_root).await {
            Ok(breakpoints) => session.restore_breakpoints(breakpoints),
            Err(e) => {
                warn!(session = %id, error = %e, "failed to load persisted breakpoints");
            }
        }

        {
            let mut inner = self.inner.lock().await;
            if inner.sessions.len() >= self.config.max_sessions {
                drop(inner);
                session.cleanup().await;
                return Err(ManagerError::LimitReached(self.config.max_sessions));
            }
            inner.sessions.insert(id, Arc::clone(&session));
        }

        info!(
            session = %id,
            project_root = %config.project_root.display(),
            language = %config.language,
            "created session"
        );
        Ok(session)
    }

    /// Look up a session and touch its last-activity. A session found idle
    /// past its timeout is retired on the spot.
    pub async fn get(&self, id: &str) -> Result<Arc<Session>, ManagerError> {
        // Narrow lock: the expired session leaves the registry here, but its
        // adapter teardown runs after the guard is dropped.
        let expired = {
            let mut inner = self.inner.lock().await;
            let session = inner
                .sessions
                .get(id)
                .cloned()
                .ok_or_else(|| ManagerError::NotFound(SessionId::from_string(id)))?;

            let idle_secs =
                Utc::now().signed_duration_since(session.last_activity()).num_seconds();
            if idle_secs <= (session.timeout_minutes() * 60) as i64 {
                session.touch();
                return Ok(session);
            }

            inner.sessions.remove(id);
            info!(session = %session.id(), idle_secs, "session expired on lookup");
            session
        };

        self.retire(&expired).await;
        Err(ManagerError::Expired(expired.id()))
    }

    pub async fn list(&self) -> Vec<Arc<Session>> {
        self.inner.lock().await.sessions.values().cloned().collect()
    }

    /// Terminate and remove a session; its persisted snapshot is deleted so
    /// the id cannot reappear in the recovery catalog.
    pub async fn terminate(&self, id: &str) -> Result<(), ManagerError> {
        let session = {
            let mut inner = self.inner.lock().await;
            inner
                .sessions
                .remove(id)
                .ok_or_else(|| ManagerError::NotFound(SessionId::from_string(id)))?
        };
        self.retire(&session).await;
        info!(session = %session.id(), "terminated session");
        Ok(())
    }

    /// Write-through persistence for a session's breakpoints.
    pub async fn save_breakpoints(&self, session: &Session) -> Result<(), ManagerError> {
        self.breakpoint_store
            .save(session.project_root(), &session.breakpoints_snapshot())
            .await?;
        Ok(())
    }

    pub async fn active_count(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    /// Persist breakpoints, drop the recoverable snapshot, and clean up.
    /// Best-effort: cleanup always proceeds.
    async fn retire(&self, session: &Arc<Session>) {
        if let Err(e) = self
            .breakpoint_store
            .save(session.project_root(), &session.breakpoints_snapshot())
            .await
        {
            warn!(session = %session.id(), error = %e, "failed to persist breakpoints");
        }
        self.session_store.delete(&session.id()).await;
        session.cleanup().await;
    }

    /// One idle-expiry sweep: retire sessions idle past their timeout or
    /// older than the configured max lifetime.
    ///
    /// The registry lock covers only the filter-and-remove pass; the slow
    /// per-session teardown runs with the guard dropped.
    pub async fn expire_stale_sessions(&self) {
        let now = Utc::now();
        let max_lifetime_secs = self.config.session_max_lifetime.as_secs() as i64;

        let stale: Vec<Arc<Session>> = {
            let mut inner = self.inner.lock().await;
            let stale_ids: Vec<SessionId> = inner
                .sessions
                .values()
                .filter(|session| {
                    let idle_secs =
                        now.signed_duration_since(session.last_activity()).num_seconds();
                    let age_secs =
                        now.signed_duration_since(session.created_at()).num_seconds();
                    idle_secs > (session.timeout_minutes() * 60) as i64
                        || age_secs > max_lifetime_secs
                })
                .map(|session| session.id())
                .collect();

            stale_ids.iter().filter_map(|id| inner.sessions.remove(id)).collect()
        };

        for session in stale {
            info!(session = %session.id(), "session expired");
            self.retire(&session).await;
        }
    }

    /// One periodic-persistence pass: snapshot every live session with
    /// `server_shutdown=false`. Per-session failures are logged and do not
    /// abort the pass.
    pub async fn persist_active_sessions(&self) {
        let sessions = self.list().await;
        for session in sessions {
            if let Err(e) = self.session_store.save(&session.to_persisted(false)).await {
                warn!(session = %session.id(), error = %e, "failed to persist session");
            }
        }
    }

    // Recovery catalog.

    /// Startup recovery: purge stale snapshots, then load the rest into the
    /// in-memory recoverable catalog.
    async fn load_recoverable(&self) {
        let cleaned = self.session_store.cleanup_old(RECOVERY_MAX_AGE_HOURS).await;
        if cleaned > 0 {
            info!(cleaned, "cleaned up old session snapshots");
        }

        let snapshots = self.session_store.list_all().await;
        let mut inner = self.inner.lock().await;
        for snapshot in snapshots {
            info!(
                session = %snapshot.id,
                project_root = %snapshot.project_root,
                "loaded recoverable session"
            );
            inner.recoverable.insert(snapshot.id, snapshot);
        }
        if !inner.recoverable.is_empty() {
            info!(count = inner.recoverable.len(), "found recoverable sessions");
        }
    }

    /// Sessions available for recovery.
    pub async fn list_recoverable(&self) -> Vec<PersistedSession> {
        self.inner.lock().await.recoverable.values().cloned().collect()
    }

    /// Create a brand-new session from a recoverable snapshot: breakpoints
    /// and watches carry over, the adapter is re-initialized, the old
    /// debuggee is not resurrected. The snapshot leaves the catalog and its
    /// file is deleted.
    ///
    /// Adapter startup runs without the registry lock. The snapshot stays in
    /// the catalog until the new session is inserted, so a failed init
    /// leaves it recoverable.
    pub async fn recover(&self, id: &str) -> Result<Arc<Session>, ManagerError> {
        let snapshot = {
            let inner = self.inner.lock().await;
            if inner.sessions.len() >= self.config.max_sessions {
                return Err(ManagerError::LimitReached(self.config.max_sessions));
            }
            inner
                .recoverable
                .get(id)
                .cloned()
                .ok_or_else(|| ManagerError::NotFound(SessionId::from_string(id)))?
        };

        let default_timeout_minutes = self.config.session_idle_timeout.as_secs() / 60;
        let session = Arc::new(Session::from_persisted(
            &snapshot,
            default_timeout_minutes,
            self.config.output_buffer_max_bytes,
        ));
        session.init_adapter(&self.registry, self.config.adapter_settings()).await?;

        {
            let mut inner = self.inner.lock().await;
            if inner.sessions.len() >= self.config.max_sessions {
                drop(inner);
                session.cleanup().await;
                return Err(ManagerError::LimitReached(self.config.max_sessions));
            }
            if inner.recoverable.remove(id).is_none() {
                // A concurrent recover or dismiss claimed the snapshot first
                drop(inner);
                session.cleanup().await;
                return Err(ManagerError::NotFound(SessionId::from_string(id)));
            }
            inner.sessions.insert(session.id(), Arc::clone(&session));
        }

        self.session_store.delete(&session.id()).await;
        info!(session = %session.id(), project_root = %snapshot.project_root, "recovered session");
        Ok(session)
    }

    /// Drop a recoverable snapshot without recovering it. Idempotent.
    pub async fn dismiss(&self, id: &str) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.recoverable.remove(id).is_some() {
            self.session_store.delete(&SessionId::from_string(id)).await;
            info!(session = %id, "dismissed recoverable session");
            true
        } else {
            false
        }
    }
}

/// Idle-expiry loop: sweep every minute until shutdown. Cancellation is the
/// normal terminator.
async fn expiry_loop(manager: Arc<SessionManager>) {
    loop {
        tokio::select! {
            _ = manager.shutdown.cancelled() => break,
            _ = tokio::time::sleep(EXPIRY_SWEEP_INTERVAL) => {
                manager.expire_stale_sessions().await;
            }
        }
    }
}

/// Periodic persistence loop: snapshot live sessions every five minutes.
async fn persist_loop(manager: Arc<SessionManager>) {
    loop {
        tokio::select! {
            _ = manager.shutdown.cancelled() => break,
            _ = tokio::time::sleep(PERSIST_INTERVAL) => {
                manager.persist_active_sessions().await;
            }
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
