// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node.js driver over vscode-js-debug in DAP server mode.
//!
//! Spawns `js-debug dap --host=127.0.0.1 --port=N` and dials back. The
//! launch schema is the `pwa-node` configuration: source maps on by default,
//! with `runtimeExecutable`, `runtimeArgs`, `skipFiles`, and `outFiles`
//! passed through for TypeScript setups.

use crate::connection::DapConnection;
use crate::{AdapterContext, AdapterError, ConfigureCallback, DebugAdapter, Language};
use async_trait::async_trait;
use relay_core::{
    AttachConfig, BreakpointVerdict, LaunchConfig, Scope, SourceBreakpoint, StackFrame, Thread,
    Variable,
};
use serde_json::{json, Value};
use std::path::PathBuf;

/// Default Node.js inspector port for attach.
const DEFAULT_INSPECTOR_PORT: u16 = 9229;

pub struct JsDebugAdapter {
    conn: DapConnection,
}

impl JsDebugAdapter {
    pub fn new(ctx: &AdapterContext) -> Self {
        Self { conn: DapConnection::new(ctx, "pwa-node") }
    }

    fn discover_js_debug(&self) -> Result<PathBuf, AdapterError> {
        which::which("js-debug").map_err(|_| AdapterError::NotFound {
            language: "javascript".to_string(),
            install: "Install vscode-js-debug: npm install -g @vscode/js-debug-cli".to_string(),
        })
    }
}

#[async_trait]
impl DebugAdapter for JsDebugAdapter {
    fn language(&self) -> Language {
        Language::Javascript
    }

    fn is_launched(&self) -> bool {
        self.conn.is_launched()
    }

    fn capabilities(&self) -> Value {
        self.conn.capabilities()
    }

    async fn initialize(&self) -> Result<Value, AdapterError> {
        let js_debug = self.discover_js_debug()?;
        let port = crate::spawn::free_port()?;
        let args = vec![
            "dap".to_string(),
            "--host=127.0.0.1".to_string(),
            format!("--port={port}"),
        ];

        let mut child = crate::spawn::spawn_server(&js_debug, &args)?;
        let stream = crate::spawn::connect_with_retry(port, &mut child, "js-debug").await?;
        let (read_half, write_half) = stream.into_split();
        self.conn
            .establish(Box::new(read_half), Box::new(write_half), Some(child), Some(port))
            .await
    }

    async fn launch(
        &self,
        config: LaunchConfig,
        configure: Option<ConfigureCallback>,
    ) -> Result<(), AdapterError> {
        let args = launch_args(&config)?;
        self.conn.handshake("launch", args, configure).await
    }

    async fn attach(
        &self,
        config: AttachConfig,
        configure: Option<ConfigureCallback>,
    ) -> Result<(), AdapterError> {
        self.conn.handshake("attach", attach_args(&config), configure).await
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        self.conn.disconnect().await;
        Ok(())
    }

    async fn terminate(&self) -> Result<(), AdapterError> {
        self.conn.disconnect().await;
        Ok(())
    }

    async fn set_breakpoints(
        &self,
        source_path: &str,
        breakpoints: &[SourceBreakpoint],
    ) -> Result<Vec<BreakpointVerdict>, AdapterError> {
        self.conn.set_breakpoints(source_path, breakpoints).await
    }

    async fn set_function_breakpoints(
        &self,
        names: &[String],
    ) -> Result<Vec<BreakpointVerdict>, AdapterError> {
        self.conn.set_function_breakpoints(names).await
    }

    async fn set_exception_breakpoints(&self, filters: &[String]) -> Result<(), AdapterError> {
        self.conn.set_exception_breakpoints(filters).await
    }

    async fn continue_execution(&self, thread_id: i64) -> Result<(), AdapterError> {
        self.conn.thread_command("continue", thread_id).await
    }

    async fn pause(&self, thread_id: i64) -> Result<(), AdapterError> {
        self.conn.thread_command("pause", thread_id).await
    }

    async fn step_over(&self, thread_id: i64) -> Result<(), AdapterError> {
        self.conn.thread_command("next", thread_id).await
    }

    async fn step_into(&self, thread_id: i64) -> Result<(), AdapterError> {
        self.conn.thread_command("stepIn", thread_id).await
    }

    async fn step_out(&self, thread_id: i64) -> Result<(), AdapterError> {
        self.conn.thread_command("stepOut", thread_id).await
    }

    async fn threads(&self) -> Result<Vec<Thread>, AdapterError> {
        self.conn.threads().await
    }

    async fn stack_trace(
        &self,
        thread_id: i64,
        start_frame: i64,
        levels: i64,
    ) -> Result<Vec<StackFrame>, AdapterError> {
        self.conn.stack_trace(thread_id, start_frame, levels).await
    }

    async fn scopes(&self, frame_id: i64) -> Result<Vec<Scope>, AdapterError> {
        self.conn.scopes(frame_id).await
    }

    async fn variables(
        &self,
        variables_reference: i64,
        start: i64,
        count: i64,
    ) -> Result<Vec<Variable>, AdapterError> {
        self.conn.variables(variables_reference, start, count).await
    }

    async fn evaluate(
        &self,
        expression: &str,
        frame_id: Option<i64>,
        context: &str,
    ) -> Result<Value, AdapterError> {
        self.conn.evaluate(expression, frame_id, context).await
    }
}

/// Promote the base launch config to the `pwa-node` launch schema.
fn launch_args(config: &LaunchConfig) -> Result<Value, AdapterError> {
    let Some(program) = &config.program else {
        return Err(AdapterError::LaunchFailed(
            "program path is required for Node.js launch".to_string(),
        ));
    };

    let mut args = serde_json::Map::new();
    args.insert("type".to_string(), json!("pwa-node"));
    args.insert("request".to_string(), json!("launch"));
    args.insert("name".to_string(), json!("Node.js Debug"));
    args.insert("program".to_string(), json!(program));
    args.insert("cwd".to_string(), json!(config.cwd.clone().unwrap_or_else(|| ".".to_string())));
    args.insert("stopOnEntry".to_string(), json!(config.stop_on_entry));
    args.insert(
        "sourceMaps".to_string(),
        config.extra.get("sourceMaps").cloned().unwrap_or(json!(true)),
    );
    args.insert(
        "timeout".to_string(),
        config.extra.get("timeout").cloned().unwrap_or(json!(30_000)),
    );

    if !config.args.is_empty() {
        args.insert("args".to_string(), json!(config.args));
    }
    if !config.env.is_empty() {
        args.insert("env".to_string(), json!(config.env));
    }
    for key in ["runtimeExecutable", "runtimeArgs", "skipFiles", "outFiles"] {
        if let Some(value) = config.extra.get(key) {
            args.insert(key.to_string(), value.clone());
        }
    }

    Ok(Value::Object(args))
}

/// Promote the base attach config to the `pwa-node` attach schema.
fn attach_args(config: &AttachConfig) -> Value {
    let mut args = serde_json::Map::new();
    args.insert("type".to_string(), json!("pwa-node"));
    args.insert("request".to_string(), json!("attach"));
    args.insert("name".to_string(), json!("Node.js Attach"));

    if let Some(process_id) = config.process_id {
        args.insert("processId".to_string(), json!(process_id));
    } else {
        args.insert("address".to_string(), json!(config.host));
        args.insert(
            "port".to_string(),
            json!(config.port.unwrap_or(DEFAULT_INSPECTOR_PORT)),
        );
    }

    Value::Object(args)
}

#[cfg(test)]
#[path = "jsdebug_tests.rs"]
mod tests;
