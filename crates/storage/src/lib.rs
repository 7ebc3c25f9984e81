// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-safe JSON-per-entity persistence: per-project breakpoint catalogs
//! and recoverable session snapshots.
//!
//! Every write goes through tmp + fsync + rename, so a file on disk is
//! either absent or a fully valid document.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod breakpoints;
mod fs;
mod sessions;

pub use breakpoints::BreakpointStore;
pub use fs::{atomic_write_json, delete_file, list_json_files, project_id_from_path, read_json};
pub use sessions::{PersistedSession, SessionStore};

use std::path::PathBuf;
use thiserror::Error;

/// Persistence-layer errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Stable error code surfaced over the external boundary.
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::WriteFailed { .. } | StorageError::Io(_) => "PERSIST_WRITE_FAILED",
            StorageError::Invalid { .. } => "PERSIST_INVALID",
        }
    }
}
