// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Score Ledger
//!
//! Records game results against a player's scorecard. Only a new personal
//! best changes anything: the per-game high score rises and the total grows
//! by the difference. Equal or lower results are accepted and ignored, which
//! makes resubmitting a result harmless.

use tracing::{debug, info};

use crate::error::{ArcadeError, ArcadeResult};
use crate::games::GameName;
use crate::storage::{ArcadeDatabase, GameScore, ScoreCard, ScoreOutcome};

/// Result of a submission, read inside the transaction that applied it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreReceipt {
    pub outcome: ScoreOutcome,
    /// Total after this submission (unchanged for a no-op)
    pub total_score: u64,
}

/// Score operations over the document store.
pub struct ScoreLedger<'a> {
    db: &'a ArcadeDatabase,
}

impl<'a> ScoreLedger<'a> {
    pub fn new(db: &'a ArcadeDatabase) -> Self {
        Self { db }
    }

    /// Submit a result for `game`.
    ///
    /// # Errors
    /// `NotFound` if the player has no scorecard.
    pub fn record_score(
        &self,
        username: &str,
        game: GameName,
        score: u64,
    ) -> ArcadeResult<ScoreReceipt> {
        let receipt = self.db.update_scorecard(username, |card| {
            let outcome = card.apply(game, score)?;
            Ok(ScoreReceipt {
                outcome,
                total_score: card.total_score,
            })
        })?;

        if receipt.outcome.is_change() {
            info!(
                username = %username,
                game = %game,
                score,
                outcome = ?receipt.outcome,
                total_score = receipt.total_score,
                "Score recorded"
            );
        } else {
            debug!(username = %username, game = %game, score, "Score below high score, ignored");
        }
        Ok(receipt)
    }

    /// High score for one game; zero when the player or game has no entry.
    pub fn high_score(&self, username: &str, game: GameName) -> ArcadeResult<u64> {
        Ok(self
            .db
            .get_scorecard(username)?
            .map(|card| card.high_score(game))
            .unwrap_or(0))
    }

    /// Per-game high scores in the order they were first recorded.
    pub fn score_card(&self, username: &str) -> ArcadeResult<Vec<GameScore>> {
        Ok(self
            .db
            .get_scorecard(username)?
            .map(|card| card.game_scores)
            .unwrap_or_default())
    }

    /// Full scorecard including the running total.
    pub fn card(&self, username: &str) -> ArcadeResult<ScoreCard> {
        self.db
            .get_scorecard(username)?
            .ok_or_else(|| ArcadeError::not_found(format!("ScoreCard {username}")))
    }
}
