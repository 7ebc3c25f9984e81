// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Native (Rust/C/C++) driver over lldb-dap or CodeLLDB.
//!
//! Two transport shapes exist: lldb-dap speaks DAP over its own
//! stdin/stdout, while CodeLLDB listens on a TCP port. lldb-dap is preferred
//! when both are installed. Discovery falls back to the VS Code extension
//! directory for CodeLLDB builds without a PATH entry.

use crate::connection::DapConnection;
use crate::{AdapterContext, AdapterError, ConfigureCallback, DebugAdapter, Language};
use async_trait::async_trait;
use relay_core::{
    AttachConfig, BreakpointVerdict, LaunchConfig, Scope, SourceBreakpoint, StackFrame, Thread,
    Variable,
};
use serde_json::{json, Value};
use std::path::PathBuf;

/// Transport shape of the discovered adapter binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LldbFlavor {
    /// DAP over the child's stdin/stdout
    LldbDap,
    /// DAP over a TCP port (`codelldb --port N`)
    CodeLldb,
}

pub struct LldbAdapter {
    conn: DapConnection,
}

impl LldbAdapter {
    pub fn new(ctx: &AdapterContext) -> Self {
        Self { conn: DapConnection::new(ctx, "lldb") }
    }
}

/// Locate an LLDB DAP binary: PATH first, then the VS Code CodeLLDB
/// extension directory, then well-known install paths.
fn find_lldb() -> Result<(PathBuf, LldbFlavor), AdapterError> {
    for (name, flavor) in [
        ("lldb-dap", LldbFlavor::LldbDap),
        ("lldb-vscode", LldbFlavor::LldbDap),
        ("codelldb", LldbFlavor::CodeLldb),
    ] {
        if let Ok(path) = which::which(name) {
            return Ok((path, flavor));
        }
    }

    if let Some(home) = dirs::home_dir() {
        for extensions in [home.join(".vscode/extensions"), home.join(".vscode-server/extensions")]
        {
            if let Some(path) = codelldb_in_extensions(&extensions) {
                return Ok((path, LldbFlavor::CodeLldb));
            }
        }
    }

    for (path, flavor) in [
        ("/usr/local/bin/lldb-dap", LldbFlavor::LldbDap),
        ("/usr/bin/lldb-dap", LldbFlavor::LldbDap),
        ("/usr/local/bin/codelldb", LldbFlavor::CodeLldb),
        ("/usr/bin/codelldb", LldbFlavor::CodeLldb),
    ] {
        let candidate = PathBuf::from(path);
        if candidate.is_file() {
            return Ok((candidate, flavor));
        }
    }

    Err(AdapterError::NotFound {
        language: "native (rust/c/c++)".to_string(),
        install: "Install lldb-dap from LLVM (e.g. apt install lldb) or the CodeLLDB \
                  VS Code extension (vadimcn.vscode-lldb)"
            .to_string(),
    })
}

fn codelldb_in_extensions(extensions: &std::path::Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(extensions).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with("vadimcn.vscode-lldb-") {
            let adapter = entry.path().join("adapter").join("codelldb");
            if adapter.is_file() {
                return Some(adapter);
            }
        }
    }
    None
}

#[async_trait]
impl DebugAdapter for LldbAdapter {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn is_launched(&self) -> bool {
        self.conn.is_launched()
    }

    fn capabilities(&self) -> Value {
        self.conn.capabilities()
    }

    async fn initialize(&self) -> Result<Value, AdapterError> {
        let (binary, flavor) = find_lldb()?;

        match flavor {
            LldbFlavor::CodeLldb => {
                let port = crate::spawn::free_port()?;
                let args = vec!["--port".to_string(), port.to_string()];
                let mut child = crate::spawn::spawn_server(&binary, &args)?;
                let stream =
                    crate::spawn::connect_with_retry(port, &mut child, "codelldb").await?;
                let (read_half, write_half) = stream.into_split();
                self.conn
                    .establish(Box::new(read_half), Box::new(write_half), Some(child), Some(port))
                    .await
            }
            LldbFlavor::LldbDap => {
                let (child, stdout, stdin) = crate::spawn::spawn_stdio(&binary, &[])?;
                self.conn
                    .establish(Box::new(stdout), Box::new(stdin), Some(child), None)
                    .await
            }
        }
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

    /// LLDB understands `cpp_throw`, `cpp_catch`, and `rust_panic`.
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

/// Promote the base launch config to the LLDB launch schema.
fn launch_args(config: &LaunchConfig) -> Result<Value, AdapterError> {
    let Some(program) = &config.program else {
        return Err(AdapterError::LaunchFailed(
            "program path is required for LLDB launch".to_string(),
        ));
    };

    let mut args = serde_json::Map::new();
    args.insert("type".to_string(), json!("lldb"));
    args.insert("request".to_string(), json!("launch"));
    args.insert("name".to_string(), json!("LLDB Debug"));
    args.insert("program".to_string(), json!(program));
    args.insert("cwd".to_string(), json!(config.cwd.clone().unwrap_or_else(|| ".".to_string())));
    args.insert("stopOnEntry".to_string(), json!(config.stop_on_entry));
    args.insert(
        "terminal".to_string(),
        config.extra.get("terminal").cloned().unwrap_or(json!("console")),
    );

    if !config.args.is_empty() {
        args.insert("args".to_string(), json!(config.args));
    }
    if !config.env.is_empty() {
        args.insert("env".to_string(), json!(config.env));
    }
    for key in [
        "sourceMap",
        "initCommands",
        "preRunCommands",
        "postRunCommands",
        "exitCommands",
        "expressions",
    ] {
        if let Some(value) = config.extra.get(key) {
            args.insert(key.to_string(), value.clone());
        }
    }

    Ok(Value::Object(args))
}

/// Promote the base attach config to the LLDB attach schema.
fn attach_args(config: &AttachConfig) -> Value {
    let mut args = serde_json::Map::new();
    args.insert("type".to_string(), json!("lldb"));
    args.insert("request".to_string(), json!("attach"));
    args.insert("name".to_string(), json!("LLDB Attach"));

    if let Some(process_id) = config.process_id {
        args.insert("pid".to_string(), json!(process_id));
    } else if let Some(wait_for) = config.extra.get("waitFor") {
        args.insert("waitFor".to_string(), wait_for.clone());
    } else if let Some(port) = config.port {
        args.insert(
            "connect".to_string(),
            json!({"host": config.host, "port": port}),
        );
    }

    // Executable path for symbol loading
    if let Some(program) = config.extra.get("program") {
        args.insert("program".to_string(), program.clone());
    }

    Value::Object(args)
}

#[cfg(test)]
#[path = "lldb_tests.rs"]
mod tests;
