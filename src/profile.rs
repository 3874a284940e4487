// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Profile Manager
//!
//! Mutations of a player's identity record and its avatar blob.
//!
//! ## Avatar Replacement
//!
//! The new blob is written before anything else changes:
//!
//! 1. Upload the new bytes.
//! 2. Swap `avatar` on the player record (atomic).
//! 3. Delete the previous blob.
//!
//! A failure in step 2 deletes the fresh upload again. A failure in step 3
//! leaves an unreferenced blob behind, which the janitor sweeps later; the
//! player never ends up without an avatar.

use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::credentials::PasswordHash;
use crate::error::{ArcadeError, ArcadeResult};
use crate::storage::{
    records::normalize_display_name, ArcadeDatabase, AvatarRef, BlobStore, GameScore,
};

/// Content types accepted for avatars.
pub const ALLOWED_AVATAR_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/gif", "image/webp"];

/// Default upper bound on avatar size (2 MiB).
pub const DEFAULT_MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

/// Reject empty, oversized, or non-image avatars.
pub fn validate_avatar(bytes: &[u8], content_type: &str, max_bytes: usize) -> ArcadeResult<()> {
    if bytes.is_empty() {
        return Err(ArcadeError::validation("avatar is empty"));
    }
    if bytes.len() > max_bytes {
        return Err(ArcadeError::validation(format!(
            "avatar exceeds {max_bytes} bytes"
        )));
    }
    if !ALLOWED_AVATAR_TYPES.contains(&content_type) {
        return Err(ArcadeError::validation(format!(
            "unsupported avatar content type '{content_type}'"
        )));
    }
    Ok(())
}

/// Avatar bytes with their content type.
#[derive(Debug, Clone)]
pub struct Avatar {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Public view of a player, as shown on the profile page.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    pub display_name: String,
    pub has_avatar: bool,
    pub total_score: u64,
    pub game_scores: Vec<GameScore>,
}

pub struct ProfileManager<'a> {
    db: &'a ArcadeDatabase,
    blobs: &'a BlobStore,
    max_avatar_bytes: usize,
}

impl<'a> ProfileManager<'a> {
    pub fn new(db: &'a ArcadeDatabase, blobs: &'a BlobStore, max_avatar_bytes: usize) -> Self {
        Self {
            db,
            blobs,
            max_avatar_bytes,
        }
    }

    /// Profile page data. A player without a scorecard shows zero scores.
    pub fn get_profile(&self, username: &str) -> ArcadeResult<Profile> {
        let player = self
            .db
            .get_player(username)?
            .ok_or_else(|| ArcadeError::not_found(format!("Player {username}")))?;
        let card = self.db.get_scorecard(username)?;

        Ok(Profile {
            username: player.username,
            display_name: player.display_name,
            has_avatar: player.avatar.is_some(),
            total_score: card.as_ref().map(|c| c.total_score).unwrap_or(0),
            game_scores: card.map(|c| c.game_scores).unwrap_or_default(),
        })
    }

    /// Rename a player. Renaming to the current name is a no-op.
    ///
    /// # Errors
    /// `NotFound` for an unknown player, `Conflict` if another player holds
    /// the name.
    pub fn change_display_name(&self, username: &str, new_name: &str) -> ArcadeResult<()> {
        let new_name = normalize_display_name(new_name)?;
        let player = self.db.update_player(username, |player| {
            player.display_name = new_name;
            Ok(())
        })?;
        info!(username = %username, display_name = %player.display_name, "Display name changed");
        Ok(())
    }

    /// Overwrite the stored credential with an already-hashed one.
    pub fn change_password(&self, username: &str, new_hash: PasswordHash) -> ArcadeResult<()> {
        self.db.update_player(username, |player| {
            player.password_hash = new_hash;
            Ok(())
        })?;
        info!(username = %username, "Password changed");
        Ok(())
    }

    /// Replace (or set) a player's avatar.
    pub fn replace_avatar(
        &self,
        username: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> ArcadeResult<AvatarRef> {
        validate_avatar(bytes, content_type, self.max_avatar_bytes)?;
        if self.db.get_player(username)?.is_none() {
            return Err(ArcadeError::not_found(format!("Player {username}")));
        }

        let meta = self.blobs.upload(username, content_type, bytes)?;
        let new_ref = AvatarRef {
            blob_id: meta.blob_id.clone(),
            content_type: content_type.to_string(),
        };

        let mut previous = None;
        let swapped = self.db.update_player(username, |player| {
            previous = player.avatar.replace(new_ref.clone());
            Ok(())
        });
        if let Err(e) = swapped {
            if let Err(cleanup) = self.blobs.delete(&meta.blob_id) {
                warn!(
                    blob_id = %meta.blob_id,
                    error = %cleanup,
                    "Failed to remove avatar upload after aborted swap"
                );
            }
            return Err(e);
        }

        if let Some(old) = previous {
            if let Err(e) = self.blobs.delete(&old.blob_id) {
                warn!(
                    username = %username,
                    blob_id = %old.blob_id,
                    error = %e,
                    "Failed to delete replaced avatar; left for the janitor"
                );
            }
        }

        info!(username = %username, blob_id = %new_ref.blob_id, size = bytes.len(), "Avatar replaced");
        Ok(new_ref)
    }

    /// Current avatar bytes.
    ///
    /// # Errors
    /// `NotFound` if the player is unknown or has no avatar.
    pub fn get_avatar(&self, username: &str) -> ArcadeResult<Avatar> {
        let player = self
            .db
            .get_player(username)?
            .ok_or_else(|| ArcadeError::not_found(format!("Player {username}")))?;
        let avatar = player
            .avatar
            .ok_or_else(|| ArcadeError::not_found(format!("Avatar of {username}")))?;

        let blob = self.blobs.download(&avatar.blob_id)?;
        Ok(Avatar {
            bytes: blob.bytes,
            content_type: avatar.content_type,
        })
    }
}
