// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project breakpoint catalog.
//!
//! One JSON file per project, keyed by the 16-hex hash of its resolved root
//! path. An empty breakpoint mapping is represented by the absence of the
//! file, never by a stale empty document.

use crate::fs::{atomic_write_json, delete_file, project_id_from_path, read_json};
use crate::StorageError;
use relay_core::SourceBreakpoint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// On-disk document shape.
#[derive(Debug, Serialize, Deserialize)]
struct BreakpointsFile {
    project_root: String,
    breakpoints: HashMap<String, Vec<SourceBreakpoint>>,
}

/// Write-through store for a project's `source path → breakpoints` mapping.
pub struct BreakpointStore {
    base_dir: PathBuf,
}

impl BreakpointStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn file_path(&self, project_root: &Path) -> PathBuf {
        self.base_dir.join(format!("{}.json", project_id_from_path(project_root)))
    }

    /// Load all breakpoints for a project; absent file is an empty mapping.
    pub async fn load(
        &self,
        project_root: &Path,
    ) -> Result<HashMap<String, Vec<SourceBreakpoint>>, StorageError> {
        match read_json::<BreakpointsFile>(&self.file_path(project_root)).await? {
            Some(file) => Ok(file.breakpoints),
            None => Ok(HashMap::new()),
        }
    }

    /// Save the whole mapping. Empty per-file lists are dropped; an empty
    /// mapping deletes the file.
    pub async fn save(
        &self,
        project_root: &Path,
        breakpoints: &HashMap<String, Vec<SourceBreakpoint>>,
    ) -> Result<(), StorageError> {
        let path = self.file_path(project_root);

        let filtered: HashMap<String, Vec<SourceBreakpoint>> = breakpoints
            .iter()
            .filter(|(_, bps)| !bps.is_empty())
            .map(|(file, bps)| (file.clone(), bps.clone()))
            .collect();

        if filtered.is_empty() {
            delete_file(&path).await;
            return Ok(());
        }

        let document = BreakpointsFile {
            project_root: project_root.display().to_string(),
            breakpoints: filtered,
        };
        atomic_write_json(&path, &document).await
    }

    /// Replace one file's breakpoint list inside the whole document
    /// (read-modify-write).
    pub async fn update_file(
        &self,
        project_root: &Path,
        file_path: &str,
        breakpoints: Vec<SourceBreakpoint>,
    ) -> Result<(), StorageError> {
        let mut all = self.load(project_root).await?;
        if breakpoints.is_empty() {
            all.remove(file_path);
        } else {
            all.insert(file_path.to_string(), breakpoints);
        }
        self.save(project_root, &all).await
    }

    /// Breakpoints for one source file.
    pub async fn get_file_breakpoints(
        &self,
        project_root: &Path,
        file_path: &str,
    ) -> Result<Vec<SourceBreakpoint>, StorageError> {
        Ok(self.load(project_root).await?.remove(file_path).unwrap_or_default())
    }

    /// Drop the whole project catalog.
    pub async fn clear(&self, project_root: &Path) -> bool {
        delete_file(&self.file_path(project_root)).await
    }
}

#[cfg(test)]
#[path = "breakpoints_tests.rs"]
mod tests;
