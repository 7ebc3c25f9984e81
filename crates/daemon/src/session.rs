// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One debug conversation: an adapter, breakpoint and watch configuration,
//! the lifecycle state machine, and event fan-out.

use crate::events::EventQueue;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use relay_adapters::{
    AdapterContext, AdapterError, AdapterRegistry, AdapterSettings, ConfigureCallback,
    DebugAdapter, EventCallback, OutputCallback,
};
use relay_core::{
    AttachConfig, BreakpointVerdict, DebugEvent, EventType, LaunchConfig, OutputBuffer,
    OutputPage, Scope, SessionId, SessionState, SourceBreakpoint, StackFrame, Thread, Variable,
};
use relay_storage::PersistedSession;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Session-level errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session '{session}' is in state '{current}', operation requires one of: [{}]", required.join(", "))]
    InvalidState {
        session: SessionId,
        current: String,
        required: Vec<String>,
    },

    #[error("session '{0}' has no initialized adapter")]
    AdapterNotInitialized(SessionId),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl SessionError {
    /// Stable error code surfaced over the external boundary.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::InvalidState { .. } | SessionError::AdapterNotInitialized(_) => {
                "INVALID_SESSION_STATE"
            }
            SessionError::Adapter(e) => e.code(),
        }
    }
}

/// Client-facing configuration for creating a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub project_root: PathBuf,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    /// Idle timeout in minutes; the manager supplies its configured default
    /// when absent.
    #[serde(default)]
    pub timeout_minutes: Option<u64>,
}

fn default_language() -> String {
    "python".to_string()
}

impl SessionConfig {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            name: None,
            language: default_language(),
            timeout_minutes: None,
        }
    }

    relay_core::setters! {
        into {
            language: String,
        }
        option {
            name: String,
        }
    }

    pub fn timeout_minutes(mut self, minutes: u64) -> Self {
        self.timeout_minutes = Some(minutes);
        self
    }
}

/// Public snapshot of a session for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub name: String,
    pub project_root: String,
    pub language: String,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub current_thread_id: Option<i64>,
    pub stop_reason: Option<String>,
    pub stop_location: Option<Value>,
}

/// Result of evaluating one watch expression.
#[derive(Debug, Clone, Serialize)]
pub struct WatchResult {
    pub expression: String,
    pub result: Option<String>,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub variables_reference: i64,
    pub error: Option<String>,
}

/// Mutable debug-time state guarded by the session state lock.
struct DebugState {
    state: SessionState,
    current_thread_id: Option<i64>,
    stop_reason: Option<String>,
    stop_location: Option<Value>,
}

/// A single debug session.
///
/// Owns exactly one adapter driver for its lifetime, one output ring, one
/// event queue, the per-file breakpoint lists, and the watch expressions.
/// State transitions take the exclusive state lock and are only ever legal
/// per the transition table.
pub struct Session {
    id: SessionId,
    name: String,
    project_root: PathBuf,
    language: String,
    timeout_minutes: u64,
    created_at: DateTime<Utc>,

    debug: Mutex<DebugState>,
    last_activity: Mutex<DateTime<Utc>>,
    adapter: Mutex<Option<Arc<dyn DebugAdapter>>>,
    output: Arc<Mutex<OutputBuffer>>,
    events: Arc<EventQueue>,
    breakpoints: Arc<Mutex<HashMap<String, Vec<SourceBreakpoint>>>>,
    watches: Mutex<Vec<String>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl Session {
    pub fn new(
        id: SessionId,
        config: &SessionConfig,
        default_timeout_minutes: u64,
        output_max_bytes: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: config.name.clone().unwrap_or_else(|| format!("session-{}", id.short(8))),
            project_root: config.project_root.clone(),
            language: config.language.clone(),
            timeout_minutes: config.timeout_minutes.unwrap_or(default_timeout_minutes),
            created_at: now,
            debug: Mutex::new(DebugState {
                state: SessionState::Created,
                current_thread_id: None,
                stop_reason: None,
                stop_location: None,
            }),
            last_activity: Mutex::new(now),
            adapter: Mutex::new(None),
            output: Arc::new(Mutex::new(OutputBuffer::new(output_max_bytes))),
            events: Arc::new(EventQueue::new()),
            breakpoints: Arc::new(Mutex::new(HashMap::new())),
            watches: Mutex::new(Vec::new()),
        }
    }

    /// Create the adapter driver for the configured language and perform its
    /// DAP initialize.
    pub async fn init_adapter(
        self: &Arc<Self>,
        registry: &AdapterRegistry,
        settings: AdapterSettings,
    ) -> Result<(), AdapterError> {
        let ctx = AdapterContext {
            session_id: self.id,
            output_callback: self.output_callback(),
            event_callback: self.event_callback(),
            settings,
        };
        let adapter = registry.create(&self.language, ctx)?;
        adapter.initialize().await?;
        *self.adapter.lock() = Some(adapter);
        Ok(())
    }

    fn output_callback(&self) -> OutputCallback {
        let output = Arc::clone(&self.output);
        Arc::new(move |category: &str, content: &str| {
            output.lock().append(category, content);
        })
    }

    fn event_callback(self: &Arc<Self>) -> EventCallback {
        let session = Arc::downgrade(self);
        Arc::new(move |event_type, data| {
            if let Some(session) = session.upgrade() {
                session.handle_event(event_type, data);
            }
        })
    }

    /// Synchronous event handler, invoked from the DAP reader. Enqueues
    /// first so the adapter reader is never blocked, then applies the
    /// state-machine effect of the event.
    fn handle_event(&self, event_type: EventType, data: Value) {
        self.events.put(event_type, data.clone());

        match event_type {
            EventType::Stopped => {
                {
                    let mut debug = self.debug.lock();
                    debug.current_thread_id = data.get("threadId").and_then(Value::as_i64);
                    debug.stop_reason =
                        data.get("reason").and_then(Value::as_str).map(str::to_string);
                }
                self.try_transition(SessionState::Paused);
            }
            EventType::Continued => self.try_transition(SessionState::Running),
            EventType::Terminated | EventType::Exited => {
                self.try_transition(SessionState::Terminated)
            }
            _ => {}
        }
    }

    /// Transition under the state lock, failing on anything outside the
    /// legal-transition table.
    pub fn transition_to(&self, new_state: SessionState) -> Result<(), SessionError> {
        {
            let mut debug = self.debug.lock();
            if let Err(illegal) = debug.state.check_transition(new_state) {
                return Err(SessionError::InvalidState {
                    session: self.id,
                    current: illegal.from.to_string(),
                    required: illegal
                        .from
                        .legal_successors()
                        .iter()
                        .map(SessionState::to_string)
                        .collect(),
                });
            }
            debug.state = new_state;
        }
        self.touch();
        tracing::info!(session = %self.id, state = %new_state, "session state changed");
        Ok(())
    }

    /// Event-driven transition; already-paused or already-terminated races
    /// are swallowed.
    fn try_transition(&self, new_state: SessionState) {
        if let Err(e) = self.transition_to(new_state) {
            tracing::debug!(session = %self.id, error = %e, "event transition skipped");
        }
    }

    fn require_state(&self, required: &[SessionState]) -> Result<(), SessionError> {
        let current = self.state();
        if required.contains(&current) {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                session: self.id,
                current: current.to_string(),
                required: required.iter().map(SessionState::to_string).collect(),
            })
        }
    }

    fn adapter(&self) -> Result<Arc<dyn DebugAdapter>, SessionError> {
        self.adapter.lock().clone().ok_or(SessionError::AdapterNotInitialized(self.id))
    }

    /// Launch the debug target. Must be CREATED; ends RUNNING, or PAUSED if
    /// a breakpoint fired during the handshake; FAILED on error.
    pub async fn launch(&self, config: LaunchConfig) -> Result<(), SessionError> {
        self.require_state(&[SessionState::Created])?;
        self.transition_to(SessionState::Launching)?;

        let result = async {
            let adapter = self.adapter()?;
            let configure = self.configure_callback(&adapter, config.stop_on_exception);
            adapter.launch(config, Some(configure)).await?;
            Ok::<(), SessionError>(())
        }
        .await;

        if let Err(e) = result {
            self.try_transition(SessionState::Failed);
            return Err(e);
        }

        if self.state() == SessionState::Launching {
            self.transition_to(SessionState::Running)?;
        }
        Ok(())
    }

    /// Attach to a running process. Same state contract as `launch`.
    pub async fn attach(&self, config: AttachConfig) -> Result<(), SessionError> {
        self.require_state(&[SessionState::Created])?;
        self.transition_to(SessionState::Launching)?;

        let result = async {
            let adapter = self.adapter()?;
            let configure = self.configure_callback(&adapter, false);
            adapter.attach(config, Some(configure)).await?;
            Ok::<(), SessionError>(())
        }
        .await;

        if let Err(e) = result {
            self.try_transition(SessionState::Failed);
            return Err(e);
        }

        if self.state() == SessionState::Launching {
            self.transition_to(SessionState::Running)?;
        }
        Ok(())
    }

    /// Configuration-phase callback: re-declare the stored breakpoints and,
    /// for launches that ask for it, an uncaught-exception filter. Runs
    /// between the adapter's `initialized` event and `configurationDone`.
    fn configure_callback(
        &self,
        adapter: &Arc<dyn DebugAdapter>,
        stop_on_exception: bool,
    ) -> ConfigureCallback {
        let adapter = Arc::clone(adapter);
        let breakpoints = Arc::clone(&self.breakpoints);
        Box::new(move || {
            let adapter = Arc::clone(&adapter);
            let snapshot: Vec<(String, Vec<SourceBreakpoint>)> = breakpoints
                .lock()
                .iter()
                .map(|(file, bps)| (file.clone(), bps.clone()))
                .collect();
            Box::pin(async move {
                for (file, bps) in &snapshot {
                    adapter.set_breakpoints(file, bps).await?;
                }
                if stop_on_exception {
                    adapter.set_exception_breakpoints(&["uncaught".to_string()]).await?;
                }
                Ok(())
            })
        })
    }

    /// Replace the per-file breakpoint list. Forwarded to the adapter when
    /// launched; otherwise unverified "Pending launch" verdicts are
    /// synthesized and the configuration phase declares them later.
    pub async fn set_breakpoints(
        &self,
        file_path: &str,
        breakpoints: Vec<SourceBreakpoint>,
    ) -> Result<Vec<BreakpointVerdict>, SessionError> {
        self.touch();
        self.breakpoints.lock().insert(file_path.to_string(), breakpoints.clone());

        let adapter = self.adapter.lock().clone();
        if let Some(adapter) = adapter {
            if adapter.is_launched() {
                return Ok(adapter.set_breakpoints(file_path, &breakpoints).await?);
            }
        }

        Ok(breakpoints.iter().map(|bp| BreakpointVerdict::pending(bp.line)).collect())
    }

    /// Continue execution. Must be PAUSED.
    pub async fn continue_execution(&self, thread_id: Option<i64>) -> Result<(), SessionError> {
        self.require_state(&[SessionState::Paused])?;
        let adapter = self.adapter()?;
        adapter.continue_execution(self.resolve_thread(thread_id)).await?;
        self.transition_to(SessionState::Running)?;

        let mut debug = self.debug.lock();
        debug.stop_reason = None;
        debug.stop_location = None;
        Ok(())
    }

    /// Request a pause. Must be RUNNING; the state changes when the
    /// adapter's `stopped` event arrives.
    pub async fn pause(&self, thread_id: Option<i64>) -> Result<(), SessionError> {
        self.require_state(&[SessionState::Running])?;
        let adapter = self.adapter()?;
        adapter.pause(self.resolve_thread(thread_id)).await?;
        Ok(())
    }

    /// Step over the current line. Must be PAUSED.
    pub async fn step_over(&self, thread_id: Option<i64>) -> Result<(), SessionError> {
        self.require_state(&[SessionState::Paused])?;
        let adapter = self.adapter()?;
        adapter.step_over(self.resolve_thread(thread_id)).await?;
        self.transition_to(SessionState::Running)?;
        Ok(())
    }

    /// Step into the called function. Must be PAUSED.
    pub async fn step_into(&self, thread_id: Option<i64>) -> Result<(), SessionError> {
        self.require_state(&[SessionState::Paused])?;
        let adapter = self.adapter()?;
        adapter.step_into(self.resolve_thread(thread_id)).await?;
        self.transition_to(SessionState::Running)?;
        Ok(())
    }

    /// Step out of the current function. Must be PAUSED.
    pub async fn step_out(&self, thread_id: Option<i64>) -> Result<(), SessionError> {
        self.require_state(&[SessionState::Paused])?;
        let adapter = self.adapter()?;
        adapter.step_out(self.resolve_thread(thread_id)).await?;
        self.transition_to(SessionState::Running)?;
        Ok(())
    }

    fn resolve_thread(&self, thread_id: Option<i64>) -> i64 {
        thread_id.or(self.debug.lock().current_thread_id).unwrap_or(1)
    }

    /// List debuggee threads. Permitted while RUNNING or PAUSED.
    pub async fn threads(&self) -> Result<Vec<Thread>, SessionError> {
        self.require_state(&[SessionState::Running, SessionState::Paused])?;
        Ok(self.adapter()?.threads().await?)
    }

    pub async fn stack_trace(
        &self,
        thread_id: Option<i64>,
        start_frame: i64,
        levels: i64,
    ) -> Result<Vec<StackFrame>, SessionError> {
        self.require_state(&[SessionState::Running, SessionState::Paused])?;
        let adapter = self.adapter()?;
        Ok(adapter.stack_trace(self.resolve_thread(thread_id), start_frame, levels).await?)
    }

    pub async fn scopes(&self, frame_id: i64) -> Result<Vec<Scope>, SessionError> {
        self.require_state(&[SessionState::Running, SessionState::Paused])?;
        Ok(self.adapter()?.scopes(frame_id).await?)
    }

    pub async fn variables(
        &self,
        variables_reference: i64,
        start: i64,
        count: i64,
    ) -> Result<Vec<Variable>, SessionError> {
        self.require_state(&[SessionState::Running, SessionState::Paused])?;
        Ok(self.adapter()?.variables(variables_reference, start, count).await?)
    }

    pub async fn evaluate(
        &self,
        expression: &str,
        frame_id: Option<i64>,
        context: &str,
    ) -> Result<Value, SessionError> {
        self.require_state(&[SessionState::Running, SessionState::Paused])?;
        Ok(self.adapter()?.evaluate(expression, frame_id, context).await?)
    }

    // Watch expressions: a de-duplicated, insertion-ordered list.

    /// Add a watch; adding an already-present expression is a no-op.
    pub fn add_watch(&self, expression: &str) -> Vec<String> {
        self.touch();
        let mut watches = self.watches.lock();
        if !watches.iter().any(|w| w == expression) {
            watches.push(expression.to_string());
        }
        watches.clone()
    }

    pub fn remove_watch(&self, expression: &str) -> Vec<String> {
        self.touch();
        let mut watches = self.watches.lock();
        watches.retain(|w| w != expression);
        watches.clone()
    }

    pub fn list_watches(&self) -> Vec<String> {
        self.watches.lock().clone()
    }

    pub fn clear_watches(&self) {
        self.touch();
        self.watches.lock().clear();
    }

    /// Evaluate every watch in `watch` context. Only meaningful while
    /// PAUSED; silently empty otherwise. Per-expression failures land in the
    /// result's `error` field instead of failing the batch.
    pub async fn evaluate_watches(&self, frame_id: Option<i64>) -> Vec<WatchResult> {
        let adapter = match self.adapter.lock().clone() {
            Some(adapter) => adapter,
            None => return Vec::new(),
        };
        if self.state() != SessionState::Paused {
            return Vec::new();
        }

        let mut results = Vec::new();
        for expression in self.list_watches() {
            match adapter.evaluate(&expression, frame_id, "watch").await {
                Ok(body) => results.push(WatchResult {
                    expression,
                    result: body.get("result").and_then(Value::as_str).map(str::to_string),
                    ty: body.get("type").and_then(Value::as_str).map(str::to_string),
                    variables_reference: body
                        .get("variablesReference")
                        .and_then(Value::as_i64)
                        .unwrap_or(0),
                    error: None,
                }),
                Err(e) => results.push(WatchResult {
                    expression,
                    result: None,
                    ty: None,
                    variables_reference: 0,
                    error: Some(e.to_string()),
                }),
            }
        }
        results
    }

    // Output retrieval.

    pub fn output_page(&self, offset: usize, limit: usize, category: Option<&str>) -> OutputPage {
        self.output.lock().get_page(offset, limit, category)
    }

    pub fn output_since(&self, line_number: u64, limit: usize) -> OutputPage {
        self.output.lock().get_since(line_number, limit)
    }

    pub fn output_dropped_lines(&self) -> u64 {
        self.output.lock().dropped_lines()
    }

    /// Long-poll the event queue.
    pub async fn get_events(&self, timeout: Option<Duration>) -> Vec<DebugEvent> {
        self.events.get_all(timeout).await
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Disconnect the adapter and clear buffers. Failures during disconnect
    /// never prevent the rest of the cleanup.
    pub async fn cleanup(&self) {
        let adapter = self.adapter.lock().take();
        if let Some(adapter) = adapter {
            if let Err(e) = adapter.disconnect().await {
                tracing::warn!(session = %self.id, error = %e, "adapter disconnect failed");
            }
        }

        self.output.lock().clear();
        self.events.clear();
        tracing::info!(session = %self.id, "session cleaned up");
    }

    // Persistence.

    /// Snapshot for the recoverable-session store.
    pub fn to_persisted(&self, server_shutdown: bool) -> PersistedSession {
        PersistedSession {
            id: self.id,
            name: self.name.clone(),
            project_root: self.project_root.display().to_string(),
            state: self.state().to_string(),
            language: self.language.clone(),
            created_at: self.created_at,
            last_activity: self.last_activity(),
            breakpoints: self.breakpoints_snapshot(),
            watch_expressions: self.list_watches(),
            saved_at: Utc::now(),
            server_shutdown,
        }
    }

    /// Build a fresh session from persisted configuration. The old debuggee
    /// is not resurrected; only breakpoints, watches, and identity carry
    /// over.
    pub fn from_persisted(
        data: &PersistedSession,
        default_timeout_minutes: u64,
        output_max_bytes: usize,
    ) -> Self {
        let config = SessionConfig {
            project_root: PathBuf::from(&data.project_root),
            name: Some(data.name.clone()),
            language: data.language.clone(),
            timeout_minutes: None,
        };
        let session =
            Session::new(data.id, &config, default_timeout_minutes, output_max_bytes);
        *session.breakpoints.lock() = data.breakpoints.clone();
        *session.watches.lock() = data.watch_expressions.clone();
        session
    }

    /// Public snapshot for API responses.
    pub fn to_info(&self) -> SessionInfo {
        let debug = self.debug.lock();
        SessionInfo {
            id: self.id,
            name: self.name.clone(),
            project_root: self.project_root.display().to_string(),
            language: self.language.clone(),
            state: debug.state,
            created_at: self.created_at,
            last_activity: *self.last_activity.lock(),
            current_thread_id: debug.current_thread_id,
            stop_reason: debug.stop_reason.clone(),
            stop_location: debug.stop_location.clone(),
        }
    }

    // Accessors.

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn state(&self) -> SessionState {
        self.debug.lock().state
    }

    pub fn timeout_minutes(&self) -> u64 {
        self.timeout_minutes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        *self.last_activity.lock()
    }

    pub fn current_thread_id(&self) -> Option<i64> {
        self.debug.lock().current_thread_id
    }

    pub fn stop_reason(&self) -> Option<String> {
        self.debug.lock().stop_reason.clone()
    }

    pub fn breakpoints_snapshot(&self) -> HashMap<String, Vec<SourceBreakpoint>> {
        self.breakpoints.lock().clone()
    }

    /// Seed the breakpoint map from the persisted per-project catalog.
    pub fn restore_breakpoints(&self, breakpoints: HashMap<String, Vec<SourceBreakpoint>>) {
        *self.breakpoints.lock() = breakpoints;
    }

    /// Update the last-activity timestamp.
    pub fn touch(&self) {
        *self.last_activity.lock() = Utc::now();
    }

    #[cfg(test)]
    pub(crate) fn set_last_activity(&self, at: DateTime<Utc>) {
        *self.last_activity.lock() = at;
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
