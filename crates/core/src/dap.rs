// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Passthrough DAP shapes.
//!
//! These mirror the Debug Adapter Protocol response bodies; the relay decodes
//! them for transport but never interprets values. Field names follow Rust
//! conventions with serde renames for the camelCase wire form. Unknown wire
//! fields are ignored so adapter-specific extensions pass through harmlessly.

use serde::{Deserialize, Serialize};

/// Verdict returned by the adapter after `setBreakpoints`.
///
/// Unverified verdicts are synthesized with message "Pending launch" when a
/// breakpoint is declared before the adapter is launched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointVerdict {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub verified: bool,
    /// Line the adapter resolved the breakpoint to (may differ from requested)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

impl BreakpointVerdict {
    /// Synthetic unverified verdict for breakpoints set before launch.
    pub fn pending(line: u32) -> Self {
        Self {
            id: None,
            verified: false,
            line: Some(line),
            column: None,
            message: Some("Pending launch".to_string()),
            source: None,
        }
    }
}

/// Source file reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(
        default,
        rename = "sourceReference",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_reference: Option<i64>,
}

/// A thread (or goroutine) in the debuggee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    pub name: String,
}

/// One frame of a stack trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackFrame {
    pub id: i64,
    /// Function name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    #[serde(default, rename = "endLine", skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    #[serde(default, rename = "endColumn", skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
}

/// A variable scope within a frame (locals, globals, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub name: String,
    #[serde(
        default,
        rename = "presentationHint",
        skip_serializing_if = "Option::is_none"
    )]
    pub presentation_hint: Option<String>,
    /// Opaque handle passed back to fetch the scope's variables
    #[serde(rename = "variablesReference")]
    pub variables_reference: i64,
    #[serde(
        default,
        rename = "namedVariables",
        skip_serializing_if = "Option::is_none"
    )]
    pub named_variables: Option<i64>,
    #[serde(
        default,
        rename = "indexedVariables",
        skip_serializing_if = "Option::is_none"
    )]
    pub indexed_variables: Option<i64>,
    #[serde(default)]
    pub expensive: bool,
}

/// A named value within a scope or compound variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Stringified value as rendered by the adapter
    pub value: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    /// Non-zero when the variable has expandable children
    #[serde(default, rename = "variablesReference")]
    pub variables_reference: i64,
    #[serde(
        default,
        rename = "namedVariables",
        skip_serializing_if = "Option::is_none"
    )]
    pub named_variables: Option<i64>,
    #[serde(
        default,
        rename = "indexedVariables",
        skip_serializing_if = "Option::is_none"
    )]
    pub indexed_variables: Option<i64>,
    #[serde(
        default,
        rename = "evaluateName",
        skip_serializing_if = "Option::is_none"
    )]
    pub evaluate_name: Option<String>,
}

#[cfg(test)]
#[path = "dap_tests.rs"]
mod tests;
