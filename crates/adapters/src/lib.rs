// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter drivers for DAP-speaking debuggers.
//!
//! Each supported language gets a driver that locates its debug adapter
//! executable, spawns and wires the subprocess, performs the DAP initialize
//! and launch handshakes, and exposes the uniform [`DebugAdapter`] capability
//! surface. The low-level request/response/event plumbing lives in
//! [`client::DapClient`]; shared protocol mechanics live in the internal
//! `DapConnection`, while argument shaping stays per-driver because the
//! launch schemas diverge materially between debuggers.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
mod connection;
mod debugpy;
mod delve;
mod error;
mod jsdebug;
mod lldb;
mod registry;
mod spawn;

pub use client::DapClient;
pub use debugpy::DebugpyAdapter;
pub use delve::DelveAdapter;
pub use error::AdapterError;
pub use jsdebug::JsDebugAdapter;
pub use lldb::LldbAdapter;
pub use registry::{AdapterFactory, AdapterRegistry, Language};

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use relay_core::{
    AttachConfig, BreakpointVerdict, EventType, LaunchConfig, Scope, SessionId, SourceBreakpoint,
    StackFrame, Thread, Variable,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Synchronous callback for debuggee output: `(category, content)`.
///
/// Invoked from the DAP reader task; it must not block.
pub type OutputCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Synchronous callback for debug events. Invoked from the DAP reader task
/// in wire order; it must not block.
pub type EventCallback = Arc<dyn Fn(EventType, Value) + Send + Sync>;

/// Async callback run during the configuration-done phase of the launch
/// handshake, between the adapter's `initialized` event and
/// `configurationDone`. Re-declares breakpoints and exception filters.
pub type ConfigureCallback =
    Box<dyn Fn() -> BoxFuture<'static, Result<(), AdapterError>> + Send + Sync>;

/// Tunables handed to every driver.
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    /// Timeout for ordinary DAP requests
    pub request_timeout: Duration,
    /// Longer timeout covering the launch/attach handshake
    pub launch_timeout: Duration,
    /// Explicit Python interpreter override
    pub python_path: Option<PathBuf>,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            launch_timeout: Duration::from_secs(60),
            python_path: None,
        }
    }
}

/// Everything a driver needs at construction time.
#[derive(Clone)]
pub struct AdapterContext {
    pub session_id: SessionId,
    pub output_callback: OutputCallback,
    pub event_callback: EventCallback,
    pub settings: AdapterSettings,
}

/// Uniform capability surface over language-specific debug adapters.
///
/// All methods take `&self`: drivers synchronise internally so the configure
/// callback can re-enter the adapter while a launch handshake is in flight.
#[async_trait]
pub trait DebugAdapter: Send + Sync {
    /// Language this driver debugs.
    fn language(&self) -> Language;

    /// Whether a debug target has been launched or attached.
    fn is_launched(&self) -> bool;

    /// Capabilities reported by the adapter's initialize response.
    fn capabilities(&self) -> Value;

    /// Locate the adapter executable, spawn it, wire the transport, and
    /// perform the DAP initialize request. Returns the capabilities.
    async fn initialize(&self) -> Result<Value, AdapterError>;

    /// Launch a debug target. `configure` runs during the
    /// configuration-done phase.
    async fn launch(
        &self,
        config: LaunchConfig,
        configure: Option<ConfigureCallback>,
    ) -> Result<(), AdapterError>;

    /// Attach to a running process. Same handshake shape as `launch`.
    async fn attach(
        &self,
        config: AttachConfig,
        configure: Option<ConfigureCallback>,
    ) -> Result<(), AdapterError>;

    /// Disconnect from the debuggee and tear the subprocess down. Idempotent.
    async fn disconnect(&self) -> Result<(), AdapterError>;

    /// Terminate the debuggee and tear down. Idempotent.
    async fn terminate(&self) -> Result<(), AdapterError>;

    async fn set_breakpoints(
        &self,
        source_path: &str,
        breakpoints: &[SourceBreakpoint],
    ) -> Result<Vec<BreakpointVerdict>, AdapterError>;

    async fn set_function_breakpoints(
        &self,
        names: &[String],
    ) -> Result<Vec<BreakpointVerdict>, AdapterError>;

    async fn set_exception_breakpoints(&self, filters: &[String]) -> Result<(), AdapterError>;

    async fn continue_execution(&self, thread_id: i64) -> Result<(), AdapterError>;

    async fn pause(&self, thread_id: i64) -> Result<(), AdapterError>;

    async fn step_over(&self, thread_id: i64) -> Result<(), AdapterError>;

    async fn step_into(&self, thread_id: i64) -> Result<(), AdapterError>;

    async fn step_out(&self, thread_id: i64) -> Result<(), AdapterError>;

    async fn threads(&self) -> Result<Vec<Thread>, AdapterError>;

    async fn stack_trace(
        &self,
        thread_id: i64,
        start_frame: i64,
        levels: i64,
    ) -> Result<Vec<StackFrame>, AdapterError>;

    async fn scopes(&self, frame_id: i64) -> Result<Vec<Scope>, AdapterError>;

    async fn variables(
        &self,
        variables_reference: i64,
        start: i64,
        count: i64,
    ) -> Result<Vec<Variable>, AdapterError>;

    /// Evaluate an expression; `context` is "watch", "repl", or "hover".
    /// Returns the raw evaluate body (`result`, `type`, `variablesReference`).
    async fn evaluate(
        &self,
        expression: &str,
        frame_id: Option<i64>,
        context: &str,
    ) -> Result<Value, AdapterError>;
}

impl std::fmt::Debug for dyn DebugAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugAdapter")
            .field("language", &self.language())
            .field("is_launched", &self.is_launched())
            .finish()
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAdapterRecorder, FakeBehavior, FakeDebugAdapter};
