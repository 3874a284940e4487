// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the on-disk storage layout.

use std::path::{Path, PathBuf};

/// Default base directory for all persistent storage.
pub const DATA_ROOT: &str = "/data";

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// redb file holding players, scorecards and their indexes.
    pub fn database_file(&self) -> PathBuf {
        self.root.join("arcade.redb")
    }

    // ========== Avatar Blob Paths ==========

    /// Directory containing all avatar blobs.
    pub fn avatars_dir(&self) -> PathBuf {
        self.root.join("avatars")
    }

    /// Raw bytes of a blob.
    pub fn blob_data(&self, blob_id: &str) -> PathBuf {
        self.avatars_dir().join(format!("{blob_id}.bin"))
    }

    /// Metadata sidecar of a blob.
    pub fn blob_meta(&self, blob_id: &str) -> PathBuf {
        self.avatars_dir().join(format!("{blob_id}.json"))
    }
}
