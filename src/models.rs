// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. JSON types derive
//! `Serialize`/`Deserialize` and `ToSchema`; the multipart form structs exist
//! only to describe their fields in the OpenAPI document.
//!
//! ## Model Categories
//!
//! - **Players**: registration and login
//! - **Scores**: score submission and scorecards
//! - **Profile**: display name, password and avatar changes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::games::GameName;
use crate::storage::{GameScore, Player, ScoreCard, ScoreOutcome};

// =============================================================================
// Player Models
// =============================================================================

/// Multipart form for `POST /v1/players`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct RegisterPlayerForm {
    pub username: String,
    pub password: String,
    pub display_name: String,
    /// Optional avatar image (png, jpeg, gif or webp).
    #[schema(value_type = Option<String>, format = Binary)]
    pub avatar: Option<Vec<u8>>,
}

/// A newly registered player.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PlayerSummary {
    pub username: String,
    pub display_name: String,
    pub has_avatar: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Player> for PlayerSummary {
    fn from(player: Player) -> Self {
        Self {
            username: player.username,
            display_name: player.display_name,
            has_avatar: player.avatar.is_some(),
            created_at: player.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LoginResponse {
    pub username: String,
    pub authenticated: bool,
}

// =============================================================================
// Score Models
// =============================================================================

/// A finished game result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordScoreRequest {
    /// Parsed by the handler so unknown names are a 400, not a body rejection
    #[schema(value_type = GameName)]
    pub game: String,
    pub score: u64,
}

/// Outcome of a score submission plus the player's new total.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct RecordScoreResponse {
    pub game: GameName,
    pub outcome: ScoreOutcome,
    pub total_score: u64,
}

/// Per-game high scores and their sum.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ScoreCardResponse {
    pub username: String,
    pub total_score: u64,
    pub game_scores: Vec<GameScore>,
}

impl From<ScoreCard> for ScoreCardResponse {
    fn from(card: ScoreCard) -> Self {
        Self {
            username: card.username,
            total_score: card.total_score,
            game_scores: card.game_scores,
        }
    }
}

// =============================================================================
// Profile Models
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DisplayNameRequest {
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PasswordRequest {
    pub password: String,
}

/// Multipart form for `PUT /v1/profile/avatar`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct AvatarForm {
    #[schema(value_type = String, format = Binary)]
    pub avatar: Vec<u8>,
}

/// Reference to a player's current avatar.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AvatarResponse {
    pub blob_id: String,
    pub content_type: String,
}
