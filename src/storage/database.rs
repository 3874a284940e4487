// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded document store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `players`: username → serialized Player
//! - `display_names`: display name → username (uniqueness index)
//! - `scorecards`: username → serialized ScoreCard
//! - `leaderboard`: composite key (!total_score|username) → username
//!
//! redb runs one write transaction at a time, so every read-modify-write
//! below (`update_player`, `update_scorecard`) is atomic with respect to
//! concurrent callers. Readers see a consistent snapshot and never block.

use std::collections::HashSet;
use std::path::Path;

use redb::{
    Database, ReadableDatabase, ReadableTable, Table, TableDefinition, WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};

use super::records::{Player, ScoreCard};
use crate::error::{ArcadeError, ArcadeResult};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: username → serialized Player (JSON bytes).
const PLAYERS: TableDefinition<&str, &[u8]> = TableDefinition::new("players");

/// Index: display name → username. Enforces display-name uniqueness.
const DISPLAY_NAMES: TableDefinition<&str, &str> = TableDefinition::new("display_names");

/// Primary table: username → serialized ScoreCard (JSON bytes).
const SCORECARDS: TableDefinition<&str, &[u8]> = TableDefinition::new("scorecards");

/// Index: composite key → username.
/// Key format: `!total_score_be|username` so a forward scan is highest-first.
const LEADERBOARD: TableDefinition<&[u8], &str> = TableDefinition::new("leaderboard");

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the leaderboard table.
///
/// The inverted total sorts highest scores first; equal totals fall back to
/// username byte order.
fn leaderboard_key(total_score: u64, username: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + username.len());
    key.extend_from_slice(&(!total_score).to_be_bytes());
    key.extend_from_slice(username.as_bytes());
    key
}

fn total_from_key(key: &[u8]) -> Option<u64> {
    let inverted: [u8; 8] = key.get(..8)?.try_into().ok()?;
    Some(!u64::from_be_bytes(inverted))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> ArcadeResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

fn encode<T: Serialize>(value: &T) -> ArcadeResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Read and decode a JSON document inside a write transaction.
fn load<T: DeserializeOwned>(
    table: &Table<'_, &'static str, &'static [u8]>,
    key: &str,
) -> ArcadeResult<Option<T>> {
    let bytes = match table.get(key)? {
        Some(value) => value.value().to_vec(),
        None => return Ok(None),
    };
    decode(&bytes).map(Some)
}

// =============================================================================
// ArcadeDatabase
// =============================================================================

/// One entry of a leaderboard scan, display name already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub username: String,
    pub display_name: String,
    pub total_score: u64,
}

/// Embedded ACID document store for players and scorecards.
pub struct ArcadeDatabase {
    db: Database,
}

impl ArcadeDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> ArcadeResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PLAYERS)?;
            let _ = write_txn.open_table(DISPLAY_NAMES)?;
            let _ = write_txn.open_table(SCORECARDS)?;
            let _ = write_txn.open_table(LEADERBOARD)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Confirms a read snapshot can be opened.
    pub fn health_check(&self) -> ArcadeResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(PLAYERS)?;
        Ok(())
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Insert a player together with a zeroed scorecard.
    ///
    /// Username and display-name uniqueness are checked inside the same
    /// transaction, so either everything is committed or nothing is.
    pub fn create_account(&self, player: &Player) -> ArcadeResult<ScoreCard> {
        let card = ScoreCard::blank(&player.username);

        let write_txn = self.db.begin_write()?;
        {
            let mut players = write_txn.open_table(PLAYERS)?;
            if players.get(player.username.as_str())?.is_some() {
                return Err(ArcadeError::conflict(format!(
                    "Username {}",
                    player.username
                )));
            }

            let mut names = write_txn.open_table(DISPLAY_NAMES)?;
            if names.get(player.display_name.as_str())?.is_some() {
                return Err(ArcadeError::conflict(format!(
                    "Display name {}",
                    player.display_name
                )));
            }

            players.insert(player.username.as_str(), encode(player)?.as_slice())?;
            names.insert(player.display_name.as_str(), player.username.as_str())?;
        }
        // A card left behind by an earlier, partially created account is replaced.
        put_scorecard(&write_txn, &card)?;
        write_txn.commit()?;

        Ok(card)
    }

    /// Look up a player by username.
    pub fn get_player(&self, username: &str) -> ArcadeResult<Option<Player>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PLAYERS)?;
        let Some(value) = table.get(username)? else {
            return Ok(None);
        };
        decode(value.value()).map(Some)
    }

    /// Atomically read, mutate and write back a player.
    ///
    /// A changed display name is moved in the uniqueness index; claiming a
    /// name held by another player fails with `Conflict` and nothing is written.
    pub fn update_player<F>(&self, username: &str, mutate: F) -> ArcadeResult<Player>
    where
        F: FnOnce(&mut Player) -> ArcadeResult<()>,
    {
        let write_txn = self.db.begin_write()?;
        let player = {
            let mut players = write_txn.open_table(PLAYERS)?;
            let mut player: Player = load(&players, username)?
                .ok_or_else(|| ArcadeError::not_found(format!("Player {username}")))?;

            let old_name = player.display_name.clone();
            mutate(&mut player)?;
            player.username = username.to_string();
            player.updated_at = chrono::Utc::now();

            if player.display_name != old_name {
                let mut names = write_txn.open_table(DISPLAY_NAMES)?;
                let holder = names
                    .get(player.display_name.as_str())?
                    .map(|v| v.value().to_string());
                if holder.is_some_and(|holder| holder != username) {
                    return Err(ArcadeError::conflict(format!(
                        "Display name {}",
                        player.display_name
                    )));
                }
                names.remove(old_name.as_str())?;
                names.insert(player.display_name.as_str(), username)?;
            }

            players.insert(username, encode(&player)?.as_slice())?;
            player
        };
        write_txn.commit()?;

        Ok(player)
    }

    /// Blob ids referenced by any player's avatar.
    pub fn avatar_blob_ids(&self) -> ArcadeResult<HashSet<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PLAYERS)?;

        let mut ids = HashSet::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let player: Player = decode(value.value())?;
            if let Some(avatar) = player.avatar {
                ids.insert(avatar.blob_id);
            }
        }
        Ok(ids)
    }

    // =========================================================================
    // Scorecards
    // =========================================================================

    /// Look up a player's scorecard.
    pub fn get_scorecard(&self, username: &str) -> ArcadeResult<Option<ScoreCard>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SCORECARDS)?;
        let Some(value) = table.get(username)? else {
            return Ok(None);
        };
        decode(value.value()).map(Some)
    }

    /// Atomically read, mutate and write back a scorecard.
    ///
    /// The card is only written (and its leaderboard key moved) when the
    /// closure bumped its revision; otherwise the transaction is dropped.
    pub fn update_scorecard<F, T>(&self, username: &str, mutate: F) -> ArcadeResult<T>
    where
        F: FnOnce(&mut ScoreCard) -> ArcadeResult<T>,
    {
        let write_txn = self.db.begin_write()?;
        let (revision, card, result) = {
            let cards = write_txn.open_table(SCORECARDS)?;
            let mut card: ScoreCard = load(&cards, username)?
                .ok_or_else(|| ArcadeError::not_found(format!("ScoreCard {username}")))?;
            let revision = card.revision;
            let result = mutate(&mut card)?;
            (revision, card, result)
        };

        if card.revision == revision {
            write_txn.abort()?;
            return Ok(result);
        }

        put_scorecard(&write_txn, &card)?;
        write_txn.commit()?;

        Ok(result)
    }

    /// Top `limit` players by total score within one read snapshot.
    ///
    /// Leaderboard entries whose player record is missing are skipped and
    /// the scan continues, so up to `limit` consistent rows are returned.
    pub fn ranked(&self, limit: usize) -> ArcadeResult<Vec<LeaderboardRow>> {
        let read_txn = self.db.begin_read()?;
        let board = read_txn.open_table(LEADERBOARD)?;
        let players = read_txn.open_table(PLAYERS)?;

        let mut rows = Vec::with_capacity(limit);
        for entry in board.iter()? {
            if rows.len() >= limit {
                break;
            }
            let (key, value) = entry?;
            let username = value.value().to_string();
            let Some(total_score) = total_from_key(key.value()) else {
                tracing::warn!(username = %username, "Skipping malformed leaderboard key");
                continue;
            };

            let Some(player) = players.get(username.as_str())? else {
                tracing::warn!(
                    username = %username,
                    "Skipping leaderboard entry without a player record"
                );
                continue;
            };
            let player: Player = decode(player.value())?;

            rows.push(LeaderboardRow {
                username,
                display_name: player.display_name,
                total_score,
            });
        }

        Ok(rows)
    }

    // =========================================================================
    // Repair
    // =========================================================================

    /// Players that have no scorecard.
    pub fn players_missing_scorecards(&self) -> ArcadeResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let players = read_txn.open_table(PLAYERS)?;
        let cards = read_txn.open_table(SCORECARDS)?;

        let mut missing = Vec::new();
        for entry in players.iter()? {
            let (key, _) = entry?;
            let username = key.value();
            if cards.get(username)?.is_none() {
                missing.push(username.to_string());
            }
        }
        Ok(missing)
    }

    /// Give an existing player a zeroed scorecard.
    ///
    /// Returns `false` if the player already had one.
    pub fn insert_blank_scorecard(&self, username: &str) -> ArcadeResult<bool> {
        let write_txn = self.db.begin_write()?;
        {
            let players = write_txn.open_table(PLAYERS)?;
            if players.get(username)?.is_none() {
                return Err(ArcadeError::not_found(format!("Player {username}")));
            }
            let cards = write_txn.open_table(SCORECARDS)?;
            if cards.get(username)?.is_some() {
                return Ok(false);
            }
        }
        put_scorecard(&write_txn, &ScoreCard::blank(username))?;
        write_txn.commit()?;
        Ok(true)
    }

    /// Drop a player's scorecard, leaving the player in place.
    #[cfg(test)]
    pub(crate) fn remove_scorecard(&self, username: &str) -> ArcadeResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut cards = write_txn.open_table(SCORECARDS)?;
            let existing: Option<ScoreCard> = load(&cards, username)?;
            if let Some(card) = existing {
                cards.remove(username)?;
                let mut board = write_txn.open_table(LEADERBOARD)?;
                board.remove(leaderboard_key(card.total_score, username).as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Insert a scorecard with no matching player.
    #[cfg(test)]
    pub(crate) fn insert_orphan_scorecard(&self, card: &ScoreCard) -> ArcadeResult<()> {
        let write_txn = self.db.begin_write()?;
        put_scorecard(&write_txn, card)?;
        write_txn.commit()?;
        Ok(())
    }
}

/// Write a scorecard and its leaderboard entry, replacing any stale card.
fn put_scorecard(write_txn: &WriteTransaction, card: &ScoreCard) -> ArcadeResult<()> {
    let mut cards = write_txn.open_table(SCORECARDS)?;
    let stale: Option<ScoreCard> = load(&cards, card.username.as_str())?;

    let mut board = write_txn.open_table(LEADERBOARD)?;
    if let Some(stale) = stale {
        board.remove(leaderboard_key(stale.total_score, &stale.username).as_slice())?;
    }

    cards.insert(card.username.as_str(), encode(card)?.as_slice())?;
    board.insert(
        leaderboard_key(card.total_score, &card.username).as_slice(),
        card.username.as_str(),
    )?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::PasswordHash;
    use crate::games::GameName;
    use crate::storage::records::AvatarRef;
    use std::sync::Arc;

    const HASH: &str = "pbkdf2-sha256$1000$c2FsdHNhbHRzYWx0c2FsdA==$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

    fn temp_db() -> (ArcadeDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = ArcadeDatabase::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn player(username: &str, display_name: &str) -> Player {
        Player::new(
            username,
            PasswordHash::parse(HASH).unwrap(),
            display_name,
            None,
        )
    }

    #[test]
    fn create_account_writes_player_and_blank_card() {
        let (db, _dir) = temp_db();
        db.create_account(&player("alice", "Alice")).unwrap();

        let stored = db.get_player("alice").unwrap().unwrap();
        assert_eq!(stored.display_name, "Alice");

        let card = db.get_scorecard("alice").unwrap().unwrap();
        assert_eq!(card.total_score, 0);
        assert!(card.game_scores.is_empty());
    }

    #[test]
    fn duplicate_username_conflicts_without_side_effects() {
        let (db, _dir) = temp_db();
        db.create_account(&player("alice", "Alice")).unwrap();
        db.update_scorecard("alice", |c| c.apply(GameName::Snake, 5))
            .unwrap();

        let err = db.create_account(&player("alice", "Other")).unwrap_err();
        assert!(matches!(err, ArcadeError::Conflict(_)));

        // The original player and card are untouched, and "Other" is still free.
        assert_eq!(db.get_player("alice").unwrap().unwrap().display_name, "Alice");
        assert_eq!(db.get_scorecard("alice").unwrap().unwrap().total_score, 5);
        db.create_account(&player("bob", "Other")).unwrap();
    }

    #[test]
    fn duplicate_display_name_conflicts() {
        let (db, _dir) = temp_db();
        db.create_account(&player("alice", "Ace")).unwrap();

        let err = db.create_account(&player("bob", "Ace")).unwrap_err();
        assert!(matches!(err, ArcadeError::Conflict(_)));
        assert!(db.get_player("bob").unwrap().is_none());
        assert!(db.get_scorecard("bob").unwrap().is_none());
    }

    #[test]
    fn update_player_moves_display_name_index() {
        let (db, _dir) = temp_db();
        db.create_account(&player("alice", "Ace")).unwrap();
        db.create_account(&player("bob", "Bee")).unwrap();

        db.update_player("alice", |p| {
            p.display_name = "Queen".into();
            Ok(())
        })
        .unwrap();

        // Old name released, taken name rejected.
        db.update_player("bob", |p| {
            p.display_name = "Ace".into();
            Ok(())
        })
        .unwrap();
        let err = db
            .update_player("bob", |p| {
                p.display_name = "Queen".into();
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, ArcadeError::Conflict(_)));
        assert_eq!(db.get_player("bob").unwrap().unwrap().display_name, "Ace");
    }

    #[test]
    fn update_player_keeps_username_immutable() {
        let (db, _dir) = temp_db();
        db.create_account(&player("alice", "Ace")).unwrap();

        let updated = db
            .update_player("alice", |p| {
                p.username = "mallory".into();
                p.avatar = Some(AvatarRef {
                    blob_id: "b".into(),
                    content_type: "image/png".into(),
                });
                Ok(())
            })
            .unwrap();

        assert_eq!(updated.username, "alice");
        assert!(db.get_player("mallory").unwrap().is_none());
        assert_eq!(db.avatar_blob_ids().unwrap(), HashSet::from(["b".to_string()]));
    }

    #[test]
    fn update_missing_player_is_not_found() {
        let (db, _dir) = temp_db();
        let err = db.update_player("ghost", |_| Ok(())).unwrap_err();
        assert!(matches!(err, ArcadeError::NotFound(_)));
    }

    #[test]
    fn update_scorecard_missing_is_not_found() {
        let (db, _dir) = temp_db();
        let err = db
            .update_scorecard("ghost", |c| c.apply(GameName::Dino, 1))
            .unwrap_err();
        assert!(matches!(err, ArcadeError::NotFound(_)));
    }

    #[test]
    fn ranked_orders_by_total_then_username() {
        let (db, _dir) = temp_db();
        for (name, score) in [("carol", 30), ("alice", 50), ("bob", 30), ("dave", 10)] {
            db.create_account(&player(name, &name.to_uppercase())).unwrap();
            db.update_scorecard(name, |c| c.apply(GameName::Snake, score))
                .unwrap();
        }

        let rows = db.ranked(3).unwrap();
        let order: Vec<(&str, u64)> = rows
            .iter()
            .map(|r| (r.username.as_str(), r.total_score))
            .collect();
        assert_eq!(order, vec![("alice", 50), ("bob", 30), ("carol", 30)]);
        assert_eq!(rows[0].display_name, "ALICE");
    }

    #[test]
    fn ranked_tracks_score_changes() {
        let (db, _dir) = temp_db();
        db.create_account(&player("alice", "A")).unwrap();
        db.create_account(&player("bob", "B")).unwrap();
        db.update_scorecard("alice", |c| c.apply(GameName::Snake, 20))
            .unwrap();
        db.update_scorecard("bob", |c| c.apply(GameName::Snake, 10))
            .unwrap();
        db.update_scorecard("bob", |c| c.apply(GameName::Dino, 15))
            .unwrap();

        let rows = db.ranked(10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].username, "bob");
        assert_eq!(rows[0].total_score, 25);
        assert_eq!(rows[1].total_score, 20);
    }

    #[test]
    fn ranked_skips_cards_without_player() {
        let (db, _dir) = temp_db();
        db.create_account(&player("alice", "A")).unwrap();
        let mut orphan = ScoreCard::blank("ghost");
        orphan.apply(GameName::Snake, 999).unwrap();
        db.insert_orphan_scorecard(&orphan).unwrap();

        let rows = db.ranked(10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username, "alice");
    }

    #[test]
    fn missing_scorecards_can_be_backfilled() {
        let (db, _dir) = temp_db();
        db.create_account(&player("alice", "A")).unwrap();
        db.create_account(&player("bob", "B")).unwrap();
        db.remove_scorecard("bob").unwrap();

        assert_eq!(db.players_missing_scorecards().unwrap(), vec!["bob"]);
        assert!(db.insert_blank_scorecard("bob").unwrap());
        assert!(!db.insert_blank_scorecard("bob").unwrap());
        assert!(db.players_missing_scorecards().unwrap().is_empty());
        assert!(matches!(
            db.insert_blank_scorecard("ghost"),
            Err(ArcadeError::NotFound(_))
        ));
    }

    #[test]
    fn concurrent_updates_preserve_total() {
        let (db, _dir) = temp_db();
        let db = Arc::new(db);
        db.create_account(&player("alice", "A")).unwrap();

        let handles: Vec<_> = GameName::ALL
            .into_iter()
            .map(|game| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || {
                    for score in 1..=40u64 {
                        db.update_scorecard("alice", |c| c.apply(game, score))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let card = db.get_scorecard("alice").unwrap().unwrap();
        assert!(card.is_consistent());
        assert_eq!(card.total_score, 40 * GameName::ALL.len() as u64);
        assert_eq!(db.ranked(1).unwrap()[0].total_score, card.total_score);
    }

    #[test]
    fn leaderboard_key_ordering() {
        // Higher totals produce smaller keys (descending scan)
        let high = leaderboard_key(2000, "zed");
        let low = leaderboard_key(1000, "amy");
        assert!(high < low, "Higher totals should sort first");
        assert_eq!(total_from_key(&high), Some(2000));
    }
}
