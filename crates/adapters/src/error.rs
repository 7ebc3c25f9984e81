// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter error surface.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors from adapter drivers and the DAP client.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// No adapter executable could be located for the language.
    #[error("{language} debug adapter not found. {install}")]
    NotFound { language: String, install: String },

    /// Subprocess or transport failure, or use before `initialize`.
    #[error("debug adapter connection error: {0}")]
    Connection(String),

    /// A DAP request did not complete within its timeout. The request seq is
    /// retired; a late response is silently discarded.
    #[error("DAP request '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// The adapter answered with `success: false`.
    #[error("DAP request '{command}' failed: {message}")]
    RequestFailed {
        command: String,
        message: String,
        /// Raw response for boundary diagnostics
        response: Value,
    },

    /// Launch or attach failed; the underlying cause is preserved verbatim.
    #[error("failed to launch debug target: {0}")]
    LaunchFailed(String),

    /// Fatal stream error on the framed transport.
    #[error(transparent)]
    Protocol(#[from] relay_wire::ProtocolError),

    /// No driver is registered for the requested language.
    #[error("language '{language}' is not supported (supported: {})", supported.join(", "))]
    UnsupportedLanguage {
        language: String,
        supported: Vec<String>,
    },
}

impl AdapterError {
    /// Stable error code surfaced over the external boundary.
    pub fn code(&self) -> &'static str {
        match self {
            AdapterError::NotFound { .. } => "ADAPTER_NOT_FOUND",
            AdapterError::Connection(_) | AdapterError::Protocol(_) => "DAP_CONNECTION",
            AdapterError::Timeout { .. } => "DAP_TIMEOUT",
            AdapterError::RequestFailed { .. } => "DAP_REQUEST_FAILED",
            AdapterError::LaunchFailed(_) => "LAUNCH_FAILED",
            AdapterError::UnsupportedLanguage { .. } => "UNSUPPORTED_LANGUAGE",
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
