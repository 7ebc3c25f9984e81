// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable fake adapter for driving sessions in tests without a real
//! debugger subprocess.

use crate::{
    AdapterContext, AdapterError, AdapterFactory, AdapterRegistry, ConfigureCallback,
    DebugAdapter, EventCallback, Language, OutputCallback,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::{
    AttachConfig, BreakpointVerdict, EventType, LaunchConfig, Scope, Source, SourceBreakpoint,
    StackFrame, Thread, Variable,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Scripted behaviour knobs for [`FakeDebugAdapter`].
#[derive(Debug, Clone, Default)]
pub struct FakeBehavior {
    /// Fail `launch`/`attach` with this message
    pub fail_launch: Option<String>,
    /// Emit a `stopped` event during the launch handshake, as if a
    /// breakpoint fired before the launch response arrived
    pub stop_on_launch: bool,
}

#[derive(Default)]
struct FakeState {
    launched: bool,
    disconnects: u32,
    calls: Vec<String>,
    breakpoints: HashMap<String, Vec<SourceBreakpoint>>,
    evaluations: HashMap<String, Value>,
    evaluation_failures: HashMap<String, String>,
}

/// In-memory [`DebugAdapter`] that records calls and lets tests emit events
/// through the session callbacks.
pub struct FakeDebugAdapter {
    behavior: FakeBehavior,
    output_callback: OutputCallback,
    event_callback: EventCallback,
    state: Mutex<FakeState>,
}

impl FakeDebugAdapter {
    pub fn new(ctx: &AdapterContext, behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            output_callback: Arc::clone(&ctx.output_callback),
            event_callback: Arc::clone(&ctx.event_callback),
            state: Mutex::new(FakeState::default()),
        }
    }

    /// Emit a debug event into the owning session, mirroring the adapter
    /// reader path: output events additionally feed the output callback.
    pub fn emit(&self, event_type: EventType, body: Value) {
        if event_type == EventType::Output {
            let category = body.get("category").and_then(Value::as_str).unwrap_or("stdout");
            let output = body.get("output").and_then(Value::as_str).unwrap_or_default();
            (self.output_callback)(category, output);
        }
        (self.event_callback)(event_type, body);
    }

    pub fn emit_output(&self, category: &str, content: &str) {
        self.emit(EventType::Output, json!({"category": category, "output": content}));
    }

    pub fn emit_stopped(&self, thread_id: i64, reason: &str) {
        self.emit(EventType::Stopped, json!({"threadId": thread_id, "reason": reason}));
    }

    pub fn emit_terminated(&self) {
        self.emit(EventType::Terminated, json!({}));
    }

    /// Script the result of `evaluate` for one expression.
    pub fn script_evaluation(&self, expression: &str, result: Value) {
        self.state.lock().evaluations.insert(expression.to_string(), result);
    }

    /// Script `evaluate` to fail for one expression.
    pub fn script_evaluation_failure(&self, expression: &str, message: &str) {
        self.state
            .lock()
            .evaluation_failures
            .insert(expression.to_string(), message.to_string());
    }

    /// Commands received, in order (e.g. `"launch"`, `"continue:1"`).
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn disconnect_count(&self) -> u32 {
        self.state.lock().disconnects
    }

    /// Breakpoints most recently forwarded for a file.
    pub fn breakpoints_for(&self, source_path: &str) -> Vec<SourceBreakpoint> {
        self.state.lock().breakpoints.get(source_path).cloned().unwrap_or_default()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().calls.push(call.into());
    }
}

#[async_trait]
impl DebugAdapter for FakeDebugAdapter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn is_launched(&self) -> bool {
        self.state.lock().launched
    }

    fn capabilities(&self) -> Value {
        json!({"supportsConfigurationDoneRequest": true})
    }

    async fn initialize(&self) -> Result<Value, AdapterError> {
        self.record("initialize");
        Ok(self.capabilities())
    }

    async fn launch(
        &self,
        _config: LaunchConfig,
        configure: Option<ConfigureCallback>,
    ) -> Result<(), AdapterError> {
        self.record("launch");
        if let Some(message) = &self.behavior.fail_launch {
            return Err(AdapterError::LaunchFailed(message.clone()));
        }
        if let Some(configure) = &configure {
            configure().await?;
        }
        self.state.lock().launched = true;
        if self.behavior.stop_on_launch {
            self.emit_stopped(1, "breakpoint");
        }
        Ok(())
    }

    async fn attach(
        &self,
        _config: AttachConfig,
        configure: Option<ConfigureCallback>,
    ) -> Result<(), AdapterError> {
        self.record("attach");
        if let Some(message) = &self.behavior.fail_launch {
            return Err(AdapterError::LaunchFailed(message.clone()));
        }
        if let Some(configure) = &configure {
            configure().await?;
        }
        self.state.lock().launched = true;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        let mut state = self.state.lock();
        state.disconnects += 1;
        state.launched = false;
        Ok(())
    }

    async fn terminate(&self) -> Result<(), AdapterError> {
        self.disconnect().await
    }

    async fn set_breakpoints(
        &self,
        source_path: &str,
        breakpoints: &[SourceBreakpoint],
    ) -> Result<Vec<BreakpointVerdict>, AdapterError> {
        self.record(format!("setBreakpoints:{source_path}"));
        self.state.lock().breakpoints.insert(source_path.to_string(), breakpoints.to_vec());
        Ok(breakpoints
            .iter()
            .filter(|bp| bp.enabled)
            .map(|bp| BreakpointVerdict {
                id: None,
                verified: true,
                line: Some(bp.line),
                column: bp.column,
                message: None,
                source: Some(Source {
                    path: Some(source_path.to_string()),
                    ..Source::default()
                }),
            })
            .collect())
    }

    async fn set_function_breakpoints(
        &self,
        names: &[String],
    ) -> Result<Vec<BreakpointVerdict>, AdapterError> {
        self.record("setFunctionBreakpoints");
        Ok(names
            .iter()
            .map(|_| BreakpointVerdict {
                id: None,
                verified: true,
                line: None,
                column: None,
                message: None,
                source: None,
            })
            .collect())
    }

    async fn set_exception_breakpoints(&self, filters: &[String]) -> Result<(), AdapterError> {
        self.record(format!("setExceptionBreakpoints:{}", filters.join(",")));
        Ok(())
    }

    async fn continue_execution(&self, thread_id: i64) -> Result<(), AdapterError> {
        self.record(format!("continue:{thread_id}"));
        Ok(())
    }

    async fn pause(&self, thread_id: i64) -> Result<(), AdapterError> {
        self.record(format!("pause:{thread_id}"));
        Ok(())
    }

    async fn step_over(&self, thread_id: i64) -> Result<(), AdapterError> {
        self.record(format!("next:{thread_id}"));
        Ok(())
    }

    async fn step_into(&self, thread_id: i64) -> Result<(), AdapterError> {
        self.record(format!("stepIn:{thread_id}"));
        Ok(())
    }

    async fn step_out(&self, thread_id: i64) -> Result<(), AdapterError> {
        self.record(format!("stepOut:{thread_id}"));
        Ok(())
    }

    async fn threads(&self) -> Result<Vec<Thread>, AdapterError> {
        Ok(vec![Thread { id: 1, name: "MainThread".to_string() }])
    }

    async fn stack_trace(
        &self,
        _thread_id: i64,
        _start_frame: i64,
        _levels: i64,
    ) -> Result<Vec<StackFrame>, AdapterError> {
        Ok(vec![StackFrame {
            id: 1,
            name: "greet".to_string(),
            source: Some(Source {
                name: Some("app.py".to_string()),
                path: Some("/work/app.py".to_string()),
                source_reference: None,
            }),
            line: 4,
            column: 1,
            end_line: None,
            end_column: None,
        }])
    }

    async fn scopes(&self, _frame_id: i64) -> Result<Vec<Scope>, AdapterError> {
        Ok(vec![Scope {
            name: "Locals".to_string(),
            presentation_hint: Some("locals".to_string()),
            variables_reference: 1001,
            named_variables: None,
            indexed_variables: None,
            expensive: false,
        }])
    }

    async fn variables(
        &self,
        _variables_reference: i64,
        _start: i64,
        _count: i64,
    ) -> Result<Vec<Variable>, AdapterError> {
        Ok(vec![Variable {
            name: "name".to_string(),
            value: "'World'".to_string(),
            ty: Some("str".to_string()),
            variables_reference: 0,
            named_variables: None,
            indexed_variables: None,
            evaluate_name: None,
        }])
    }

    async fn evaluate(
        &self,
        expression: &str,
        _frame_id: Option<i64>,
        context: &str,
    ) -> Result<Value, AdapterError> {
        self.record(format!("evaluate:{context}:{expression}"));
        {
            let state = self.state.lock();
            if let Some(message) = state.evaluation_failures.get(expression) {
                return Err(AdapterError::RequestFailed {
                    command: "evaluate".to_string(),
                    message: message.clone(),
                    response: Value::Null,
                });
            }
            if let Some(result) = state.evaluations.get(expression) {
                return Ok(result.clone());
            }
        }
        Ok(json!({
            "result": format!("<{expression}>"),
            "type": "str",
            "variablesReference": 0,
        }))
    }
}

/// Hands out fake-adapter factories and keeps handles to every adapter the
/// registry constructs, so tests can emit events after the fact.
#[derive(Clone, Default)]
pub struct FakeAdapterRecorder {
    behavior: FakeBehavior,
    created: Arc<Mutex<Vec<Arc<FakeDebugAdapter>>>>,
}

impl FakeAdapterRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: FakeBehavior) -> Self {
        Self { behavior, created: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Registry wiring every language to this recorder's fake adapter.
    pub fn registry(&self) -> AdapterRegistry {
        let mut registry = AdapterRegistry::new();
        for language in Language::all() {
            registry.register(*language, self.factory());
        }
        registry
    }

    pub fn factory(&self) -> AdapterFactory {
        let recorder = self.clone();
        Arc::new(move |ctx| {
            let adapter = Arc::new(FakeDebugAdapter::new(&ctx, recorder.behavior.clone()));
            recorder.created.lock().push(Arc::clone(&adapter));
            adapter as Arc<dyn DebugAdapter>
        })
    }

    /// The most recently constructed adapter.
    pub fn last(&self) -> Option<Arc<FakeDebugAdapter>> {
        self.created.lock().last().cloned()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }
}
