// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistent records: players and their scorecards.
//!
//! Both are stored as JSON documents keyed by username. The scorecard owns
//! the high-score arithmetic so the `total_score` invariant is enforced in
//! one place regardless of which store commits it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::credentials::PasswordHash;
use crate::error::{ArcadeError, ArcadeResult};
use crate::games::GameName;

const USERNAME_MIN: usize = 3;
const NAME_MAX: usize = 32;

// =============================================================================
// Player
// =============================================================================

/// Reference from a player to its avatar blob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvatarRef {
    pub blob_id: String,
    pub content_type: String,
}

/// Identity record. One per username, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    /// Unique, immutable login name
    pub username: String,
    pub password_hash: PasswordHash,
    /// Unique, mutable name shown on the leaderboard
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<AvatarRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Player {
    pub fn new(
        username: impl Into<String>,
        password_hash: PasswordHash,
        display_name: impl Into<String>,
        avatar: Option<AvatarRef>,
    ) -> Self {
        let now = Utc::now();
        Self {
            username: username.into(),
            password_hash,
            display_name: display_name.into(),
            avatar,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Usernames are 3-32 ASCII alphanumerics, `_`, `-` or `.`.
pub fn validate_username(username: &str) -> ArcadeResult<()> {
    let len = username.len();
    if !(USERNAME_MIN..=NAME_MAX).contains(&len) {
        return Err(ArcadeError::validation(format!(
            "username must be {USERNAME_MIN}-{NAME_MAX} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ArcadeError::validation(
            "username may only contain letters, digits, '_', '-' and '.'",
        ));
    }
    Ok(())
}

/// Trim a display name and check its length and characters.
pub fn normalize_display_name(display_name: &str) -> ArcadeResult<String> {
    let trimmed = display_name.trim();
    let chars = trimmed.chars().count();
    if chars == 0 || chars > NAME_MAX {
        return Err(ArcadeError::validation(format!(
            "display name must be 1-{NAME_MAX} characters"
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ArcadeError::validation(
            "display name must not contain control characters",
        ));
    }
    Ok(trimmed.to_string())
}

// =============================================================================
// ScoreCard
// =============================================================================

/// Best score for one game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct GameScore {
    pub game: GameName,
    pub high_score: u64,
}

/// What a score submission did to the scorecard.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ScoreOutcome {
    /// First score for this game.
    FirstScore { high_score: u64 },
    /// Beat the previous high score.
    NewHighScore { previous: u64, high_score: u64 },
    /// Not above the current high score; nothing changed.
    Unchanged { high_score: u64 },
}

impl ScoreOutcome {
    pub fn is_change(&self) -> bool {
        !matches!(self, ScoreOutcome::Unchanged { .. })
    }
}

/// Per-player aggregate of high scores.
///
/// `total_score` is always the sum of `game_scores[*].high_score`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreCard {
    pub username: String,
    pub total_score: u64,
    /// One entry per game, in the order first played
    pub game_scores: Vec<GameScore>,
    /// Bumped on every committed change
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
}

impl ScoreCard {
    /// Zeroed card created alongside a new player.
    pub fn blank(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            total_score: 0,
            game_scores: Vec::new(),
            revision: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn high_score(&self, game: GameName) -> u64 {
        self.game_scores
            .iter()
            .find(|gs| gs.game == game)
            .map(|gs| gs.high_score)
            .unwrap_or(0)
    }

    /// Apply a score submission. Lower or equal scores are a no-op.
    pub fn apply(&mut self, game: GameName, score: u64) -> ArcadeResult<ScoreOutcome> {
        let overflow = || ArcadeError::validation("total score would overflow");

        let outcome = match self.game_scores.iter_mut().find(|gs| gs.game == game) {
            None => {
                self.total_score = self.total_score.checked_add(score).ok_or_else(overflow)?;
                self.game_scores.push(GameScore {
                    game,
                    high_score: score,
                });
                ScoreOutcome::FirstScore { high_score: score }
            }
            Some(entry) if score > entry.high_score => {
                let previous = entry.high_score;
                self.total_score = self
                    .total_score
                    .checked_add(score - previous)
                    .ok_or_else(overflow)?;
                entry.high_score = score;
                ScoreOutcome::NewHighScore {
                    previous,
                    high_score: score,
                }
            }
            Some(entry) => {
                return Ok(ScoreOutcome::Unchanged {
                    high_score: entry.high_score,
                })
            }
        };

        self.revision += 1;
        self.updated_at = Utc::now();
        debug_assert!(self.is_consistent());
        Ok(outcome)
    }

    /// Checks `total_score == sum(high_score)`.
    pub fn is_consistent(&self) -> bool {
        let sum = self
            .game_scores
            .iter()
            .try_fold(0u64, |acc, gs| acc.checked_add(gs.high_score));
        sum == Some(self.total_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alice_scenario() {
        let mut card = ScoreCard::blank("alice");

        card.apply(GameName::Snake, 50).unwrap();
        assert_eq!(card.total_score, 50);

        card.apply(GameName::Dino, 30).unwrap();
        assert_eq!(card.total_score, 80);

        let outcome = card.apply(GameName::Snake, 40).unwrap();
        assert_eq!(outcome, ScoreOutcome::Unchanged { high_score: 50 });
        assert_eq!(card.total_score, 80);

        let outcome = card.apply(GameName::Snake, 70).unwrap();
        assert_eq!(
            outcome,
            ScoreOutcome::NewHighScore {
                previous: 50,
                high_score: 70
            }
        );
        assert_eq!(card.total_score, 100);
        assert!(card.is_consistent());
    }

    #[test]
    fn repeated_score_is_noop() {
        let mut card = ScoreCard::blank("bob");
        card.apply(GameName::Simon, 12).unwrap();
        let revision = card.revision;

        let outcome = card.apply(GameName::Simon, 12).unwrap();
        assert!(!outcome.is_change());
        assert_eq!(card.total_score, 12);
        assert_eq!(card.high_score(GameName::Simon), 12);
        assert_eq!(card.revision, revision);
    }

    #[test]
    fn first_zero_score_creates_entry() {
        let mut card = ScoreCard::blank("carol");
        let outcome = card.apply(GameName::Card, 0).unwrap();
        assert_eq!(outcome, ScoreOutcome::FirstScore { high_score: 0 });
        assert_eq!(card.game_scores.len(), 1);
        assert_eq!(card.total_score, 0);
    }

    #[test]
    fn missing_game_reads_as_zero() {
        let card = ScoreCard::blank("dave");
        assert_eq!(card.high_score(GameName::Flappy), 0);
    }

    #[test]
    fn overflow_is_rejected_without_mutation() {
        let mut card = ScoreCard::blank("erin");
        card.apply(GameName::Snake, u64::MAX).unwrap();
        let before = card.clone();

        let err = card.apply(GameName::Dino, 1).unwrap_err();
        assert!(matches!(err, ArcadeError::Validation(_)));
        assert_eq!(card, before);
    }

    #[test]
    fn inconsistent_card_is_detected() {
        let mut card = ScoreCard::blank("frank");
        card.apply(GameName::Snake, 10).unwrap();
        card.total_score = 11;
        assert!(!card.is_consistent());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a.b-c_9").is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("../etc").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
    }

    #[test]
    fn display_name_is_trimmed_and_checked() {
        assert_eq!(normalize_display_name("  Ace  ").unwrap(), "Ace");
        assert!(normalize_display_name("   ").is_err());
        assert!(normalize_display_name("bad\nname").is_err());
        assert!(normalize_display_name(&"é".repeat(32)).is_ok());
        assert!(normalize_display_name(&"é".repeat(33)).is_err());
    }
}
