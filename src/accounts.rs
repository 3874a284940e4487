// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Accounts
//!
//! Registration, credential checks, and the repair paths that keep players,
//! scorecards and avatar blobs consistent.
//!
//! Registration writes the player and its zeroed scorecard in one store
//! transaction, so a player without a scorecard can only come from data
//! written before that guarantee existed. [`Accounts::repair_missing_scorecards`]
//! backfills those.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::credentials::{PasswordHash, PasswordHasher};
use crate::error::{ArcadeError, ArcadeResult};
use crate::profile::validate_avatar;
use crate::storage::{
    records::{normalize_display_name, validate_username},
    ArcadeDatabase, AvatarRef, BlobStore, Player,
};

/// Avatar supplied at registration.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Registration request, password already hashed.
#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub username: String,
    pub password_hash: PasswordHash,
    pub display_name: String,
    pub avatar: Option<AvatarUpload>,
}

/// Result of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,
    WrongPassword,
    UnknownPlayer,
}

pub struct Accounts<'a> {
    db: &'a ArcadeDatabase,
    blobs: &'a BlobStore,
    max_avatar_bytes: usize,
}

impl<'a> Accounts<'a> {
    pub fn new(db: &'a ArcadeDatabase, blobs: &'a BlobStore, max_avatar_bytes: usize) -> Self {
        Self {
            db,
            blobs,
            max_avatar_bytes,
        }
    }

    /// Register a player with a zeroed scorecard.
    ///
    /// The avatar (if any) is uploaded first and removed again when the
    /// account cannot be created.
    ///
    /// # Errors
    /// `Conflict` if the username or display name is taken, `Validation` for
    /// malformed input.
    pub fn create_player(&self, request: NewPlayer) -> ArcadeResult<Player> {
        validate_username(&request.username)?;
        let display_name = normalize_display_name(&request.display_name)?;
        if let Some(avatar) = &request.avatar {
            validate_avatar(&avatar.bytes, &avatar.content_type, self.max_avatar_bytes)?;
        }

        let avatar = match &request.avatar {
            Some(upload) => {
                let meta = self
                    .blobs
                    .upload(&request.username, &upload.content_type, &upload.bytes)?;
                Some(AvatarRef {
                    blob_id: meta.blob_id,
                    content_type: upload.content_type.clone(),
                })
            }
            None => None,
        };

        let player = Player::new(
            &request.username,
            request.password_hash,
            display_name,
            avatar,
        );

        if let Err(e) = self.db.create_account(&player) {
            if let Some(avatar) = &player.avatar {
                if let Err(cleanup) = self.blobs.delete(&avatar.blob_id) {
                    warn!(
                        blob_id = %avatar.blob_id,
                        error = %cleanup,
                        "Failed to remove avatar of rejected registration"
                    );
                }
            }
            return Err(e);
        }

        info!(
            username = %player.username,
            display_name = %player.display_name,
            has_avatar = player.avatar.is_some(),
            "Player registered"
        );
        Ok(player)
    }

    /// Check a plaintext password against the stored hash.
    pub fn validate_login(
        &self,
        hasher: &PasswordHasher,
        username: &str,
        password: &str,
    ) -> ArcadeResult<LoginOutcome> {
        let Some(player) = self.db.get_player(username)? else {
            return Ok(LoginOutcome::UnknownPlayer);
        };
        if hasher.verify(password, &player.password_hash) {
            Ok(LoginOutcome::Authenticated)
        } else {
            warn!(username = %username, "Login rejected: wrong password");
            Ok(LoginOutcome::WrongPassword)
        }
    }

    /// Give every player without a scorecard a zeroed one.
    ///
    /// Returns how many cards were created.
    pub fn repair_missing_scorecards(&self) -> ArcadeResult<usize> {
        let mut repaired = 0;
        for username in self.db.players_missing_scorecards()? {
            match self.db.insert_blank_scorecard(&username) {
                Ok(true) => {
                    warn!(username = %username, "Backfilled missing scorecard");
                    repaired += 1;
                }
                Ok(false) => {}
                Err(ArcadeError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(repaired)
    }

    /// Delete blobs created before `older_than` that no player references,
    /// plus files left behind by interrupted uploads.
    ///
    /// Recent blobs are left alone so uploads whose reference swap is still
    /// in flight are not collected. Returns how many blobs and partial files
    /// were removed.
    pub fn sweep_orphaned_avatars(&self, older_than: DateTime<Utc>) -> ArcadeResult<usize> {
        let mut removed = self
            .blobs
            .sweep_partial_uploads(SystemTime::from(older_than))?;

        // List blobs before snapshotting references; see above.
        let blobs = self.blobs.list()?;
        let referenced = self.db.avatar_blob_ids()?;

        for meta in blobs {
            if referenced.contains(&meta.blob_id) || meta.created_at >= older_than {
                continue;
            }
            match self.blobs.delete(&meta.blob_id) {
                Ok(()) | Err(ArcadeError::NotFound(_)) => {
                    info!(blob_id = %meta.blob_id, name = %meta.name, "Removed orphaned avatar blob");
                    removed += 1;
                }
                Err(e) => {
                    warn!(blob_id = %meta.blob_id, error = %e, "Failed to remove orphaned avatar blob");
                }
            }
        }
        Ok(removed)
    }
}
