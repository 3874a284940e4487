// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Binary asset store for avatar images.
//!
//! Each blob is two files under `avatars/`:
//!
//! ```text
//! avatars/
//!   {blob_id}.bin    # raw bytes
//!   {blob_id}.json   # BlobMeta (name, content type, size, sha256)
//! ```
//!
//! Blob ids are assigned by the store (UUIDv4), so identical uploads from two
//! players never share storage. Reads recompute the SHA-256 digest and fail
//! with [`StoreError::Integrity`] when the bytes were altered on disk.
//!
//! Writes go through `{file}.tmp` then a rename. An interrupted upload can
//! leave a temp file or a `.bin` without its `.json`; neither is listed, and
//! [`BlobStore::sweep_partial_uploads`] removes them once they are old enough.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::StoragePaths;
use crate::error::{ArcadeError, ArcadeResult, StoreError};

/// Sidecar metadata describing a stored blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlobMeta {
    pub blob_id: String,
    /// Upload name (the owning username at upload time)
    pub name: String,
    pub content_type: String,
    pub size: u64,
    /// Lowercase hex SHA-256 of the bytes
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

/// A blob read back from the store.
#[derive(Debug, Clone)]
pub struct Blob {
    pub meta: BlobMeta,
    pub bytes: Vec<u8>,
}

fn digest_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Filesystem-backed blob store.
#[derive(Debug, Clone)]
pub struct BlobStore {
    paths: StoragePaths,
}

impl BlobStore {
    /// Open the store, creating the avatars directory if needed.
    pub fn open(paths: StoragePaths) -> ArcadeResult<Self> {
        fs::create_dir_all(paths.avatars_dir())?;
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Store `bytes` as a new blob and return its metadata.
    pub fn upload(&self, name: &str, content_type: &str, bytes: &[u8]) -> ArcadeResult<BlobMeta> {
        let meta = BlobMeta {
            blob_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
            sha256: digest_hex(bytes),
            created_at: Utc::now(),
        };

        // Bytes first: a blob is only listed once its metadata exists.
        let data_path = self.paths.blob_data(&meta.blob_id);
        write_atomic(&data_path, bytes)?;
        let json = serde_json::to_vec_pretty(&meta)?;
        if let Err(e) = write_atomic(&self.paths.blob_meta(&meta.blob_id), &json) {
            if let Err(cleanup) = remove_if_present(&data_path) {
                tracing::warn!(blob_id = %meta.blob_id, error = %cleanup, "Failed to remove bytes of aborted upload");
            }
            return Err(e.into());
        }

        tracing::debug!(blob_id = %meta.blob_id, size = meta.size, "Blob stored");
        Ok(meta)
    }

    /// Read a blob and verify its digest.
    pub fn download(&self, blob_id: &str) -> ArcadeResult<Blob> {
        let meta = self.meta(blob_id)?;
        let bytes = match fs::read(self.paths.blob_data(blob_id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ArcadeError::not_found(format!("Blob {blob_id}")))
            }
            Err(e) => return Err(e.into()),
        };

        let actual = digest_hex(&bytes);
        if actual != meta.sha256 {
            return Err(StoreError::Integrity(format!(
                "blob {blob_id} digest mismatch (expected {}, found {actual})",
                meta.sha256
            ))
            .into());
        }

        Ok(Blob { meta, bytes })
    }

    /// Read only the metadata of a blob.
    pub fn meta(&self, blob_id: &str) -> ArcadeResult<BlobMeta> {
        if Uuid::parse_str(blob_id).is_err() {
            return Err(ArcadeError::not_found(format!("Blob {blob_id}")));
        }
        let file = match File::open(self.paths.blob_meta(blob_id)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ArcadeError::not_found(format!("Blob {blob_id}")))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn exists(&self, blob_id: &str) -> bool {
        self.meta(blob_id).is_ok()
    }

    /// Remove a blob. Fails with `NotFound` only if neither file existed.
    pub fn delete(&self, blob_id: &str) -> ArcadeResult<()> {
        if Uuid::parse_str(blob_id).is_err() {
            return Err(ArcadeError::not_found(format!("Blob {blob_id}")));
        }
        let removed_data = remove_if_present(&self.paths.blob_data(blob_id))?;
        let removed_meta = remove_if_present(&self.paths.blob_meta(blob_id))?;
        if !removed_data && !removed_meta {
            return Err(ArcadeError::not_found(format!("Blob {blob_id}")));
        }
        tracing::debug!(blob_id = %blob_id, "Blob deleted");
        Ok(())
    }

    /// Metadata of every stored blob. Unreadable sidecars are skipped.
    pub fn list(&self) -> ArcadeResult<Vec<BlobMeta>> {
        let mut blobs = Vec::new();
        for entry in fs::read_dir(self.paths.avatars_dir())? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Some(blob_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.meta(blob_id) {
                Ok(meta) => blobs.push(meta),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable blob metadata");
                }
            }
        }
        Ok(blobs)
    }

    /// Remove leftovers of interrupted uploads last modified before
    /// `older_than`: temp files and `.bin` files without a `.json` sidecar.
    ///
    /// Returns how many files were removed.
    pub fn sweep_partial_uploads(&self, older_than: SystemTime) -> ArcadeResult<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(self.paths.avatars_dir())? {
            let entry = entry?;
            let path = entry.path();
            if !self.is_partial_upload(&path) {
                continue;
            }

            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot read age of partial upload");
                    continue;
                }
            };
            if modified >= older_than {
                continue;
            }

            match remove_if_present(&path) {
                Ok(true) => {
                    tracing::info!(path = %path.display(), "Removed partial upload");
                    removed += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial upload");
                }
            }
        }
        Ok(removed)
    }

    fn is_partial_upload(&self, path: &Path) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("tmp") => true,
            Some("bin") => path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .filter(|stem| Uuid::parse_str(stem).is_ok())
                .is_some_and(|blob_id| !self.paths.blob_meta(blob_id).exists()),
            _ => false,
        }
    }

    /// Write-read-delete probe of the avatars directory.
    pub fn health_check(&self) -> ArcadeResult<()> {
        let probe = self.paths.avatars_dir().join(".health_check");
        let data = b"health_check_data";

        fs::write(&probe, data)?;
        let read = fs::read(&probe)?;
        fs::remove_file(&probe)?;

        if read != data {
            return Err(StoreError::Integrity("health check data mismatch".to_string()).into());
        }
        Ok(())
    }
}

/// `{path}.tmp`, distinct for each target so a blob's two files never share one.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write to a temp file then rename over the target.
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let temp_path = temp_path(path);
    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(data)?;
        writer.flush()?;
    }
    fs::rename(&temp_path, path)
}

fn remove_if_present(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
