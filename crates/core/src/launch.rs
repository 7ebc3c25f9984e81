// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Language-agnostic launch and attach configuration.
//!
//! Each adapter driver promotes these base forms to its variant-specific
//! launch argument schema at the boundary; language-specific options travel
//! in `extra` under the keys the variant documents.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for launching a debug target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Path to the program (script, main package, or compiled executable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    /// Python alternative to `program` (e.g. "pytest")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub stop_on_entry: bool,
    /// Declare an uncaught-exception filter during the configuration phase
    #[serde(default = "default_true")]
    pub stop_on_exception: bool,
    /// Variant-specific passthrough options (delve `mode`, LLDB
    /// `sourceMap`, node `runtimeExecutable`, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

impl LaunchConfig {
    pub fn program(path: impl Into<String>) -> Self {
        Self { program: Some(path.into()), ..Self::default() }
    }

    pub fn module(module: impl Into<String>) -> Self {
        Self { module: Some(module.into()), ..Self::default() }
    }

    crate::setters! {
        set {
            args: Vec<String>,
            env: HashMap<String, String>,
            stop_on_entry: bool,
            stop_on_exception: bool,
        }
        option {
            cwd: String,
        }
    }

    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Configuration for attaching to a running process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<u32>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self { host: default_host(), port: None, process_id: None, extra: serde_json::Map::new() }
    }
}

impl AttachConfig {
    pub fn port(port: u16) -> Self {
        Self { port: Some(port), ..Self::default() }
    }

    pub fn process_id(pid: u32) -> Self {
        Self { process_id: Some(pid), ..Self::default() }
    }
}
