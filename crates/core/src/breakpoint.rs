// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source breakpoint definitions.

use serde::{Deserialize, Serialize};

/// A requested breakpoint within a source file.
///
/// The per-file breakpoint list is replace-all on each set: a line carries at
/// most one breakpoint per file. Disabled breakpoints are kept in session
/// state but filtered out before forwarding to the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBreakpoint {
    /// 1-based source line
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    /// Expression that must evaluate truthy for the break to fire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Hit-count expression (e.g. ">= 3")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_condition: Option<String>,
    /// Logpoint template; when set the adapter logs instead of breaking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_message: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl SourceBreakpoint {
    pub fn new(line: u32) -> Self {
        Self {
            line,
            column: None,
            condition: None,
            hit_condition: None,
            log_message: None,
            enabled: true,
        }
    }

    crate::setters! {
        set {
            enabled: bool,
        }
        option {
            condition: String,
            hit_condition: String,
            log_message: String,
        }
    }

    pub fn column(mut self, column: u32) -> Self {
        self.column = Some(column);
        self
    }
}

#[cfg(test)]
#[path = "breakpoint_tests.rs"]
mod tests;
