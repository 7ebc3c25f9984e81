// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared DAP protocol mechanics for adapter drivers.
//!
//! `DapConnection` owns the subprocess, the [`DapClient`], and the launch
//! handshake state machine. Drivers keep discovery and argument shaping to
//! themselves and delegate everything protocol-shaped here.

use crate::client::{BoxedReader, BoxedWriter, DapClient, RawEventCallback};
use crate::{AdapterContext, AdapterError, AdapterSettings, ConfigureCallback};
use crate::{EventCallback, OutputCallback};
use parking_lot::Mutex;
use relay_core::{BreakpointVerdict, EventType, Scope, SessionId, SourceBreakpoint, StackFrame};
use relay_core::{Thread, Variable};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::oneshot;

struct ConnShared {
    session_id: SessionId,
    adapter_id: &'static str,
    settings: AdapterSettings,
    output_callback: OutputCallback,
    event_callback: EventCallback,
    state: Mutex<ConnState>,
}

#[derive(Default)]
struct ConnState {
    client: Option<Arc<DapClient>>,
    process: Option<Child>,
    port: Option<u16>,
    initialized: bool,
    launched: bool,
    capabilities: Value,
    /// One-shot gate tripped when the adapter's `initialized` event arrives
    init_gate: Option<oneshot::Sender<()>>,
}

/// Cloning hands out another handle onto the same connection.
#[derive(Clone)]
pub(crate) struct DapConnection {
    shared: Arc<ConnShared>,
}

impl DapConnection {
    pub(crate) fn new(ctx: &AdapterContext, adapter_id: &'static str) -> Self {
        Self {
            shared: Arc::new(ConnShared {
                session_id: ctx.session_id,
                adapter_id,
                settings: ctx.settings.clone(),
                output_callback: Arc::clone(&ctx.output_callback),
                event_callback: Arc::clone(&ctx.event_callback),
                state: Mutex::new(ConnState::default()),
            }),
        }
    }

    /// Raw event handler wired into the DAP client reader.
    ///
    /// `initialized` trips the handshake gate and is not fanned out; output
    /// events additionally feed the output callback; everything else maps
    /// onto [`EventType`] and goes to the session.
    fn raw_event_handler(&self) -> RawEventCallback {
        let shared = Arc::downgrade(&self.shared);
        Arc::new(move |event: &str, body: &Value| {
            let Some(shared) = shared.upgrade() else {
                return;
            };

            if event == "initialized" {
                if let Some(gate) = shared.state.lock().init_gate.take() {
                    let _ = gate.send(());
                }
                return;
            }

            if event == "output" {
                let category = body.get("category").and_then(Value::as_str).unwrap_or("stdout");
                let output = body.get("output").and_then(Value::as_str).unwrap_or_default();
                (shared.output_callback)(category, output);
            }

            if let Some(event_type) = EventType::from_dap(event) {
                (shared.event_callback)(event_type, body.clone());
            }
        })
    }

    /// Wire a freshly established transport, then perform DAP initialize
    /// with the relay's fixed client capability set.
    pub(crate) async fn establish(
        &self,
        reader: BoxedReader,
        writer: BoxedWriter,
        process: Option<Child>,
        port: Option<u16>,
    ) -> Result<Value, AdapterError> {
        let client = Arc::new(DapClient::start(
            reader,
            writer,
            Some(self.raw_event_handler()),
            self.shared.settings.request_timeout,
        ));

        {
            let mut state = self.shared.state.lock();
            state.client = Some(Arc::clone(&client));
            state.process = process;
            state.port = port;
        }

        match client.send("initialize", initialize_args(self.shared.adapter_id), None).await {
            Ok(capabilities) => {
                {
                    let mut state = self.shared.state.lock();
                    state.initialized = true;
                    state.capabilities = capabilities.clone();
                }
                tracing::info!(
                    session = %self.shared.session_id,
                    adapter = self.shared.adapter_id,
                    port = ?port,
                    "adapter initialized"
                );
                Ok(capabilities)
            }
            Err(e) => {
                self.disconnect().await;
                Err(AdapterError::Connection(format!(
                    "failed to initialize {}: {e}",
                    self.shared.adapter_id
                )))
            }
        }
    }

    fn client(&self) -> Result<Arc<DapClient>, AdapterError> {
        self.shared
            .state
            .lock()
            .client
            .clone()
            .ok_or_else(|| AdapterError::Connection("adapter not initialized".to_string()))
    }

    pub(crate) fn is_launched(&self) -> bool {
        self.shared.state.lock().launched
    }

    pub(crate) fn capabilities(&self) -> Value {
        self.shared.state.lock().capabilities.clone()
    }

    pub(crate) async fn request(&self, command: &str, args: Value) -> Result<Value, AdapterError> {
        self.client()?.send(command, args, None).await
    }

    /// Run the launch/attach handshake.
    ///
    /// Two concurrent subtasks: the launch request itself, and the
    /// configuration phase that waits for the `initialized` gate, runs the
    /// configure callback, and sends `configurationDone`. The launch response
    /// will not arrive until `configurationDone` is sent, so this must not be
    /// collapsed into a sequential flow.
    pub(crate) async fn handshake(
        &self,
        kind: &'static str,
        args: Value,
        configure: Option<ConfigureCallback>,
    ) -> Result<(), AdapterError> {
        let client = self.client()?;
        let launch_timeout = self.shared.settings.launch_timeout;

        let (gate_tx, gate_rx) = oneshot::channel();
        self.shared.state.lock().init_gate = Some(gate_tx);

        let request = async {
            client.send(kind, args, Some(launch_timeout)).await?;
            Ok::<(), AdapterError>(())
        };

        let configuration = async {
            match tokio::time::timeout(launch_timeout, gate_rx).await {
                Ok(Ok(())) => {}
                _ => {
                    return Err(AdapterError::LaunchFailed(
                        "timeout waiting for initialized event".to_string(),
                    ))
                }
            }
            if let Some(configure) = &configure {
                configure().await?;
            }
            client.send("configurationDone", json!({}), None).await?;
            Ok(())
        };

        let result = tokio::try_join!(request, configuration);
        self.shared.state.lock().init_gate = None;

        match result {
            Ok(_) => {
                self.shared.state.lock().launched = true;
                tracing::info!(
                    session = %self.shared.session_id,
                    adapter = self.shared.adapter_id,
                    kind,
                    "debug target ready"
                );
                Ok(())
            }
            Err(e @ AdapterError::LaunchFailed(_)) => Err(e),
            Err(e) => Err(AdapterError::LaunchFailed(e.to_string())),
        }
    }

    pub(crate) async fn set_breakpoints(
        &self,
        source_path: &str,
        breakpoints: &[SourceBreakpoint],
    ) -> Result<Vec<BreakpointVerdict>, AdapterError> {
        let wire: Vec<Value> =
            breakpoints.iter().filter(|bp| bp.enabled).map(breakpoint_args).collect();
        let body = self
            .request(
                "setBreakpoints",
                json!({"source": {"path": source_path}, "breakpoints": wire}),
            )
            .await?;
        parse_list(&body, "breakpoints")
    }

    pub(crate) async fn set_function_breakpoints(
        &self,
        names: &[String],
    ) -> Result<Vec<BreakpointVerdict>, AdapterError> {
        let wire: Vec<Value> = names.iter().map(|name| json!({"name": name})).collect();
        let body =
            self.request("setFunctionBreakpoints", json!({"breakpoints": wire})).await?;
        parse_list(&body, "breakpoints")
    }

    pub(crate) async fn set_exception_breakpoints(
        &self,
        filters: &[String],
    ) -> Result<(), AdapterError> {
        self.request("setExceptionBreakpoints", json!({"filters": filters})).await?;
        Ok(())
    }

    /// Execution-control request addressed to one thread.
    pub(crate) async fn thread_command(
        &self,
        command: &str,
        thread_id: i64,
    ) -> Result<(), AdapterError> {
        self.request(command, json!({"threadId": thread_id})).await?;
        Ok(())
    }

    pub(crate) async fn threads(&self) -> Result<Vec<Thread>, AdapterError> {
        let body = self.request("threads", json!({})).await?;
        parse_list(&body, "threads")
    }

    pub(crate) async fn stack_trace(
        &self,
        thread_id: i64,
        start_frame: i64,
        levels: i64,
    ) -> Result<Vec<StackFrame>, AdapterError> {
        let body = self
            .request(
                "stackTrace",
                json!({"threadId": thread_id, "startFrame": start_frame, "levels": levels}),
            )
            .await?;
        parse_list(&body, "stackFrames")
    }

    pub(crate) async fn scopes(&self, frame_id: i64) -> Result<Vec<Scope>, AdapterError> {
        let body = self.request("scopes", json!({"frameId": frame_id})).await?;
        parse_list(&body, "scopes")
    }

    pub(crate) async fn variables(
        &self,
        variables_reference: i64,
        start: i64,
        count: i64,
    ) -> Result<Vec<Variable>, AdapterError> {
        let mut args = serde_json::Map::new();
        args.insert("variablesReference".to_string(), json!(variables_reference));
        if start > 0 {
            args.insert("start".to_string(), json!(start));
        }
        if count > 0 {
            args.insert("count".to_string(), json!(count));
        }
        let body = self.request("variables", Value::Object(args)).await?;
        parse_list(&body, "variables")
    }

    pub(crate) async fn evaluate(
        &self,
        expression: &str,
        frame_id: Option<i64>,
        context: &str,
    ) -> Result<Value, AdapterError> {
        let mut args = serde_json::Map::new();
        args.insert("expression".to_string(), json!(expression));
        args.insert("context".to_string(), json!(context));
        if let Some(frame_id) = frame_id {
            args.insert("frameId".to_string(), json!(frame_id));
        }
        self.request("evaluate", Value::Object(args)).await
    }

    /// Tear everything down: best-effort `disconnect` with
    /// `terminateDebuggee`, stop the client, close the transport, then stop
    /// the child. Idempotent; errors are swallowed so cleanup always
    /// proceeds.
    pub(crate) async fn disconnect(&self) {
        let (client, process) = {
            let mut state = self.shared.state.lock();
            state.initialized = false;
            state.launched = false;
            state.port = None;
            state.init_gate = None;
            (state.client.take(), state.process.take())
        };

        if let Some(client) = client {
            let _ = client
                .send(
                    "disconnect",
                    json!({"terminateDebuggee": true}),
                    Some(Duration::from_secs(5)),
                )
                .await;
            client.stop().await;
        }

        if let Some(child) = process {
            crate::spawn::shutdown_child(child).await;
        }

        tracing::info!(
            session = %self.shared.session_id,
            adapter = self.shared.adapter_id,
            "adapter disconnected"
        );
    }
}

/// Fixed client capability set sent with every initialize request.
fn initialize_args(adapter_id: &str) -> Value {
    json!({
        "clientID": "relay",
        "clientName": "Debug Relay",
        "adapterID": adapter_id,
        "pathFormat": "path",
        "linesStartAt1": true,
        "columnsStartAt1": true,
        "supportsVariableType": true,
        "supportsVariablePaging": true,
        "supportsRunInTerminalRequest": false,
        "supportsProgressReporting": false,
    })
}

fn breakpoint_args(bp: &SourceBreakpoint) -> Value {
    let mut args = serde_json::Map::new();
    args.insert("line".to_string(), json!(bp.line));
    if let Some(column) = bp.column {
        args.insert("column".to_string(), json!(column));
    }
    if let Some(condition) = &bp.condition {
        args.insert("condition".to_string(), json!(condition));
    }
    if let Some(hit_condition) = &bp.hit_condition {
        args.insert("hitCondition".to_string(), json!(hit_condition));
    }
    if let Some(log_message) = &bp.log_message {
        args.insert("logMessage".to_string(), json!(log_message));
    }
    Value::Object(args)
}

/// Decode a typed list out of a response body; a missing key is an empty
/// list, a malformed one is a protocol error.
fn parse_list<T: DeserializeOwned>(body: &Value, key: &str) -> Result<Vec<T>, AdapterError> {
    match body.get(key) {
        Some(list) => serde_json::from_value(list.clone())
            .map_err(|e| AdapterError::Protocol(relay_wire::ProtocolError::InvalidJson(e))),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
