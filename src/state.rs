// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::accounts::Accounts;
use crate::config::Config;
use crate::credentials::PasswordHasher;
use crate::error::ArcadeResult;
use crate::ledger::ScoreLedger;
use crate::profile::ProfileManager;
use crate::ranking::RankingEngine;
use crate::storage::{ArcadeDatabase, BlobStore, StoragePaths};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<ArcadeDatabase>,
    pub blobs: Arc<BlobStore>,
    pub hasher: Arc<PasswordHasher>,
}

impl AppState {
    /// Open the document and blob stores under `config.data_dir`.
    pub fn open(config: Config) -> ArcadeResult<Self> {
        let paths = StoragePaths::new(&config.data_dir);
        let db = ArcadeDatabase::open(&paths.database_file())?;
        let blobs = BlobStore::open(paths)?;
        let hasher = PasswordHasher::new(config.password_iterations);

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            blobs: Arc::new(blobs),
            hasher: Arc::new(hasher),
        })
    }

    pub fn ledger(&self) -> ScoreLedger<'_> {
        ScoreLedger::new(&self.db)
    }

    pub fn ranking(&self) -> RankingEngine<'_> {
        RankingEngine::new(&self.db)
    }

    pub fn profiles(&self) -> ProfileManager<'_> {
        ProfileManager::new(&self.db, &self.blobs, self.config.max_avatar_bytes)
    }

    pub fn accounts(&self) -> Accounts<'_> {
        Accounts::new(&self.db, &self.blobs, self.config.max_avatar_bytes)
    }
}
