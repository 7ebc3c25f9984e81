// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Go driver over delve's native DAP server.
//!
//! Spawns `dlv dap --listen=127.0.0.1:N` and dials back. Delve compiles the
//! target itself, so the launch schema carries `mode`, `buildFlags`, and
//! `output` in addition to the common fields.

use crate::connection::DapConnection;
use crate::{AdapterContext, AdapterError, ConfigureCallback, DebugAdapter, Language};
use async_trait::async_trait;
use relay_core::{
    AttachConfig, BreakpointVerdict, LaunchConfig, Scope, SourceBreakpoint, StackFrame, Thread,
    Variable,
};
use serde_json::{json, Value};
use std::path::PathBuf;

pub struct DelveAdapter {
    conn: DapConnection,
}

impl DelveAdapter {
    pub fn new(ctx: &AdapterContext) -> Self {
        Self { conn: DapConnection::new(ctx, "dlv-dap") }
    }

    fn discover_dlv(&self) -> Result<PathBuf, AdapterError> {
        which::which("dlv").map_err(|_| AdapterError::NotFound {
            language: "go".to_string(),
            install: "Install delve: go install github.com/go-delve/delve/cmd/dlv@latest"
                .to_string(),
        })
    }
}

#[async_trait]
impl DebugAdapter for DelveAdapter {
    fn language(&self) -> Language {
        Language::Go
    }

    fn is_launched(&self) -> bool {
        self.conn.is_launched()
    }

    fn capabilities(&self) -> Value {
        self.conn.capabilities()
    }

    async fn initialize(&self) -> Result<Value, AdapterError> {
        let dlv = self.discover_dlv()?;
        let port = crate::spawn::free_port()?;
        let args = vec!["dap".to_string(), format!("--listen=127.0.0.1:{port}")];

        let mut child = crate::spawn::spawn_server(&dlv, &args)?;
        let stream = crate::spawn::connect_with_retry(port, &mut child, "dlv").await?;
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

    /// Delve understands the `panic` and `fatal` filters.
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

/// Promote the base launch config to delve's launch schema.
fn launch_args(config: &LaunchConfig) -> Result<Value, AdapterError> {
    let Some(program) = &config.program else {
        return Err(AdapterError::LaunchFailed(
            "program path is required for Go launch".to_string(),
        ));
    };

    let mut args = serde_json::Map::new();
    args.insert("request".to_string(), json!("launch"));
    args.insert(
        "mode".to_string(),
        config.extra.get("mode").cloned().unwrap_or_else(|| json!("debug")),
    );
    args.insert("program".to_string(), json!(program));
    args.insert("cwd".to_string(), json!(config.cwd.clone().unwrap_or_else(|| ".".to_string())));
    args.insert("stopOnEntry".to_string(), json!(config.stop_on_entry));

    if !config.args.is_empty() {
        args.insert("args".to_string(), json!(config.args));
    }
    if !config.env.is_empty() {
        args.insert("env".to_string(), json!(config.env));
    }
    if let Some(build_flags) = config.extra.get("buildFlags") {
        args.insert("buildFlags".to_string(), build_flags.clone());
    }
    if let Some(output) = config.extra.get("output") {
        args.insert("output".to_string(), output.clone());
    }

    Ok(Value::Object(args))
}

/// Promote the base attach config to delve's attach schema.
fn attach_args(config: &AttachConfig) -> Value {
    let mut args = serde_json::Map::new();
    args.insert("request".to_string(), json!("attach"));
    args.insert(
        "mode".to_string(),
        config.extra.get("mode").cloned().unwrap_or_else(|| json!("local")),
    );

    if let Some(process_id) = config.process_id {
        args.insert("processId".to_string(), json!(process_id));
    } else if let Some(port) = config.port {
        args.insert("host".to_string(), json!(config.host));
        args.insert("port".to_string(), json!(port));
    }

    Value::Object(args)
}

#[cfg(test)]
#[path = "delve_tests.rs"]
mod tests;
