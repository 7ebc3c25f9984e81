// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Python driver over debugpy's adapter in server mode.
//!
//! Spawns `python -m debugpy.adapter --host 127.0.0.1 --port N` and dials
//! back. Launch arguments always carry `justMyCode=false` and
//! `redirectOutput=true`, plus an env overlay (`PYTHONUNBUFFERED=1`,
//! `TERM=dumb`) so the debuggee cannot reach for the terminal.

use crate::connection::DapConnection;
use crate::{AdapterContext, AdapterError, ConfigureCallback, DebugAdapter, Language};
use async_trait::async_trait;
use relay_core::{
    AttachConfig, BreakpointVerdict, LaunchConfig, Scope, SourceBreakpoint, StackFrame, Thread,
    Variable,
};
use serde_json::{json, Value};
use std::path::PathBuf;

pub struct DebugpyAdapter {
    conn: DapConnection,
    python_override: Option<PathBuf>,
}

impl DebugpyAdapter {
    pub fn new(ctx: &AdapterContext) -> Self {
        Self {
            conn: DapConnection::new(ctx, "debugpy"),
            python_override: ctx.settings.python_path.clone(),
        }
    }

    fn discover_python(&self) -> Result<PathBuf, AdapterError> {
        if let Some(path) = &self.python_override {
            return Ok(path.clone());
        }
        for name in ["python3", "python"] {
            if let Ok(path) = which::which(name) {
                return Ok(path);
            }
        }
        Err(AdapterError::NotFound {
            language: "python".to_string(),
            install: "Install Python 3 and debugpy: pip install debugpy".to_string(),
        })
    }
}

#[async_trait]
impl DebugAdapter for DebugpyAdapter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn is_launched(&self) -> bool {
        self.conn.is_launched()
    }

    fn capabilities(&self) -> Value {
        self.conn.capabilities()
    }

    async fn initialize(&self) -> Result<Value, AdapterError> {
        let python = self.discover_python()?;
        let port = crate::spawn::free_port()?;
        let args = vec![
            "-m".to_string(),
            "debugpy.adapter".to_string(),
            "--host".to_string(),
            "127.0.0.1".to_string(),
            "--port".to_string(),
            port.to_string(),
        ];

        let mut child = crate::spawn::spawn_server(&python, &args)?;
        let stream = crate::spawn::connect_with_retry(port, &mut child, "debugpy").await?;
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

/// Promote the base launch config to debugpy's launch schema.
fn launch_args(config: &LaunchConfig) -> Result<Value, AdapterError> {
    let mut env = config.env.clone();
    env.insert("PYTHONUNBUFFERED".to_string(), "1".to_string());
    env.insert("TERM".to_string(), "dumb".to_string());

    let mut args = serde_json::Map::new();
    args.insert("cwd".to_string(), json!(config.cwd.clone().unwrap_or_else(|| ".".to_string())));
    args.insert("env".to_string(), json!(env));
    args.insert("stopOnEntry".to_string(), json!(config.stop_on_entry));
    args.insert("justMyCode".to_string(), json!(false));
    args.insert("console".to_string(), json!("internalConsole"));
    args.insert("redirectOutput".to_string(), json!(true));

    if let Some(program) = &config.program {
        args.insert("program".to_string(), json!(program));
    } else if let Some(module) = &config.module {
        args.insert("module".to_string(), json!(module));
    } else {
        return Err(AdapterError::LaunchFailed(
            "either program or module must be specified".to_string(),
        ));
    }

    if !config.args.is_empty() {
        args.insert("args".to_string(), json!(config.args));
    }
    if let Some(python_args) = config.extra.get("pythonArgs") {
        args.insert("pythonArgs".to_string(), python_args.clone());
    }
    if let Some(python) = config.extra.get("python") {
        args.insert("python".to_string(), python.clone());
    }

    Ok(Value::Object(args))
}

/// Promote the base attach config to debugpy's attach schema.
fn attach_args(config: &AttachConfig) -> Value {
    let mut args = serde_json::Map::new();
    args.insert("justMyCode".to_string(), json!(false));
    args.insert("redirectOutput".to_string(), json!(true));

    if let Some(process_id) = config.process_id {
        args.insert("processId".to_string(), json!(process_id));
    } else {
        args.insert(
            "connect".to_string(),
            json!({"host": config.host, "port": config.port}),
        );
    }

    Value::Object(args)
}

#[cfg(test)]
#[path = "debugpy_tests.rs"]
mod tests;
