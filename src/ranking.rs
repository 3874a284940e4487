// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ranking Engine
//!
//! Read-only leaderboard over total scores. Holds no state of its own: every
//! call is answered from a fresh read snapshot of the document store.

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ArcadeResult;
use crate::storage::ArcadeDatabase;

/// Leaderboard size when the caller does not ask for one.
pub const DEFAULT_LIMIT: usize = 10;

/// Largest leaderboard a single call will return.
pub const MAX_LIMIT: usize = 100;

/// One leaderboard row.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct RankedPlayer {
    /// 1-based position
    pub rank: usize,
    pub username: String,
    pub display_name: String,
    pub total_score: u64,
}

pub struct RankingEngine<'a> {
    db: &'a ArcadeDatabase,
}

impl<'a> RankingEngine<'a> {
    pub fn new(db: &'a ArcadeDatabase) -> Self {
        Self { db }
    }

    /// Players ordered by total score descending, then username ascending.
    ///
    /// `limit` is capped at `MAX_LIMIT`; zero yields an empty board.
    pub fn top_players(&self, limit: usize) -> ArcadeResult<Vec<RankedPlayer>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = limit.min(MAX_LIMIT);
        let rows = self.db.ranked(limit)?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| RankedPlayer {
                rank: i + 1,
                username: row.username,
                display_name: row.display_name,
                total_score: row.total_score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::PasswordHasher;
    use crate::games::GameName;
    use crate::ledger::ScoreLedger;
    use crate::storage::Player;
    use std::num::NonZeroU32;
    use tempfile::TempDir;

    fn setup(players: usize) -> (TempDir, ArcadeDatabase) {
        let temp = TempDir::new().unwrap();
        let db = ArcadeDatabase::open(&temp.path().join("ranking.redb")).unwrap();
        let hasher = PasswordHasher::new(NonZeroU32::new(1).unwrap());
        let ledger = ScoreLedger::new(&db);

        for i in 0..players {
            let username = format!("player{i:02}");
            let player = Player::new(
                &username,
                hasher.hash("pw").unwrap(),
                format!("Player {i}"),
                None,
            );
            db.create_account(&player).unwrap();
            ledger
                .record_score(&username, GameName::Snake, (i as u64) * 10)
                .unwrap();
        }
        (temp, db)
    }

    #[test]
    fn default_limit_returns_at_most_ten_sorted() {
        let (_temp, db) = setup(15);
        let top = RankingEngine::new(&db).top_players(DEFAULT_LIMIT).unwrap();

        assert_eq!(top.len(), 10);
        assert!(top.windows(2).all(|w| w[0].total_score >= w[1].total_score));
        assert_eq!(top[0].username, "player14");
        assert_eq!(top[0].display_name, "Player 14");
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[9].rank, 10);
    }

    #[test]
    fn fewer_players_than_limit() {
        let (_temp, db) = setup(3);
        let top = RankingEngine::new(&db).top_players(10).unwrap();
        assert_eq!(top.len(), 3);
    }

    #[test]
    fn zero_limit_is_empty_and_large_limit_is_capped() {
        let (_temp, db) = setup(3);
        let engine = RankingEngine::new(&db);
        assert!(engine.top_players(0).unwrap().is_empty());
        assert_eq!(engine.top_players(1).unwrap().len(), 1);
        assert_eq!(engine.top_players(usize::MAX).unwrap().len(), 3);
    }

    #[test]
    fn ties_break_on_username() {
        let temp = TempDir::new().unwrap();
        let db = ArcadeDatabase::open(&temp.path().join("ties.redb")).unwrap();
        let hasher = PasswordHasher::new(NonZeroU32::new(1).unwrap());
        for name in ["zoe", "amy", "max"] {
            db.create_account(&Player::new(name, hasher.hash("pw").unwrap(), name, None))
                .unwrap();
            ScoreLedger::new(&db)
                .record_score(name, GameName::Dino, 42)
                .unwrap();
        }

        let names: Vec<String> = RankingEngine::new(&db)
            .top_players(10)
            .unwrap()
            .into_iter()
            .map(|p| p.username)
            .collect();
        assert_eq!(names, vec!["amy", "max", "zoe"]);
    }
}
