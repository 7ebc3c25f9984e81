// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic file primitives shared by the stores.

use crate::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Stable 16-hex-char project ID derived from the resolved absolute path.
pub fn project_id_from_path(project_root: &Path) -> String {
    let normalized = project_root
        .canonicalize()
        .unwrap_or_else(|_| project_root.to_path_buf());
    let digest = Sha256::digest(normalized.to_string_lossy().as_bytes());
    let mut hex = format!("{:x}", digest);
    hex.truncate(16);
    hex
}

/// Write JSON atomically: serialise once, write `<target>.tmp`, fsync,
/// rename. On any error the tmp file is removed and nothing is observable at
/// the target path.
pub async fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let write_failed = |source: std::io::Error| StorageError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let content = serde_json::to_vec_pretty(value).map_err(|e| StorageError::WriteFailed {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;

    let tmp = path.with_extension("tmp");
    let result = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&content).await?;
        file.sync_all().await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok::<(), std::io::Error>(())
    }
    .await;

    if let Err(source) = result {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_failed(source));
    }
    Ok(())
}

/// Read a JSON document. Missing file is `None`; malformed JSON is
/// `PERSIST_INVALID` rather than a silent wipe.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::Io(e)),
    };

    serde_json::from_slice(&content).map(Some).map_err(|source| StorageError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Best-effort delete; false when the file did not exist.
pub async fn delete_file(path: &Path) -> bool {
    tokio::fs::remove_file(path).await.is_ok()
}

/// All `*.json` entries in a directory, sorted. A missing directory is an
/// empty listing.
pub async fn list_json_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return files;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    files
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
