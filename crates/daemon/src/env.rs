// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use relay_adapters::AdapterSettings;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAX_SESSIONS: u64 = 10;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_MAX_LIFETIME_SECS: u64 = 14_400;
pub const DEFAULT_OUTPUT_BUFFER_BYTES: u64 = 50 * 1024 * 1024;
pub const DEFAULT_DAP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DAP_LAUNCH_TIMEOUT_SECS: u64 = 60;

/// Relay configuration, environment-overridable with clamped bounds.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Admission limit for concurrent sessions
    pub max_sessions: usize,
    /// Default idle timeout for sessions that do not specify one
    pub session_idle_timeout: Duration,
    /// Sessions older than this are expired regardless of activity
    pub session_max_lifetime: Duration,
    /// Byte budget for each session's output ring
    pub output_buffer_max_bytes: usize,
    /// Timeout for ordinary DAP requests
    pub dap_timeout: Duration,
    /// Timeout covering the launch/attach handshake
    pub dap_launch_timeout: Duration,
    /// Root directory for persisted state
    pub data_dir: PathBuf,
    /// Explicit Python interpreter override
    pub python_path: Option<PathBuf>,
}

impl RelayConfig {
    /// Load configuration from `RELAY_*` environment variables,
    /// clamping out-of-range values to their nearest bound.
    pub fn from_env() -> Self {
        Self {
            max_sessions: env_u64("RELAY_MAX_SESSIONS", DEFAULT_MAX_SESSIONS, 1, 100) as usize,
            session_idle_timeout: Duration::from_secs(env_u64(
                "RELAY_SESSION_IDLE_TIMEOUT_SECS",
                DEFAULT_IDLE_TIMEOUT_SECS,
                60,
                u64::MAX,
            )),
            session_max_lifetime: Duration::from_secs(env_u64(
                "RELAY_SESSION_MAX_LIFETIME_SECS",
                DEFAULT_MAX_LIFETIME_SECS,
                300,
                u64::MAX,
            )),
            output_buffer_max_bytes: env_u64(
                "RELAY_OUTPUT_BUFFER_MAX_BYTES",
                DEFAULT_OUTPUT_BUFFER_BYTES,
                1024 * 1024,
                500 * 1024 * 1024,
            ) as usize,
            dap_timeout: Duration::from_secs(env_u64(
                "RELAY_DAP_TIMEOUT_SECS",
                DEFAULT_DAP_TIMEOUT_SECS,
                1,
                300,
            )),
            dap_launch_timeout: Duration::from_secs(env_u64(
                "RELAY_DAP_LAUNCH_TIMEOUT_SECS",
                DEFAULT_DAP_LAUNCH_TIMEOUT_SECS,
                5,
                600,
            )),
            data_dir: state_dir(),
            python_path: std::env::var("RELAY_PYTHON").ok().map(PathBuf::from),
        }
    }

    /// Defaults with an explicit data directory (used by tests).
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS as usize,
            session_idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            session_max_lifetime: Duration::from_secs(DEFAULT_MAX_LIFETIME_SECS),
            output_buffer_max_bytes: DEFAULT_OUTPUT_BUFFER_BYTES as usize,
            dap_timeout: Duration::from_secs(DEFAULT_DAP_TIMEOUT_SECS),
            dap_launch_timeout: Duration::from_secs(DEFAULT_DAP_LAUNCH_TIMEOUT_SECS),
            data_dir: data_dir.into(),
            python_path: None,
        }
    }

    /// Directory for per-project breakpoint catalogs.
    pub fn breakpoints_dir(&self) -> PathBuf {
        self.data_dir.join("breakpoints")
    }

    /// Directory for recoverable session snapshots.
    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    /// Daemon log file path.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("relay.log")
    }

    /// Create the data directories if they do not exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.breakpoints_dir())?;
        std::fs::create_dir_all(self.sessions_dir())?;
        Ok(())
    }

    /// Tunables handed to adapter drivers.
    pub fn adapter_settings(&self) -> AdapterSettings {
        AdapterSettings {
            request_timeout: self.dap_timeout,
            launch_timeout: self.dap_launch_timeout,
            python_path: self.python_path.clone(),
        }
    }
}

/// Resolve the data directory:
/// `RELAY_DATA_DIR` > `$XDG_STATE_HOME/relay` > `~/.local/state/relay`.
fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RELAY_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("relay");
    }
    match dirs::home_dir() {
        Some(home) => home.join(".local/state/relay"),
        None => PathBuf::from("relay-state"),
    }
}

fn env_u64(name: &str, default: u64, min: u64, max: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
