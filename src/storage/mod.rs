// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state for the arcade lives under a single data directory:
//!
//! ```text
//! /data/
//!   arcade.redb          # players, display-name index, scorecards, leaderboard
//!   avatars/
//!     {blob_id}.bin      # avatar bytes
//!     {blob_id}.json     # avatar metadata (content type, size, sha256)
//! ```
//!
//! [`ArcadeDatabase`] is the document store; [`BlobStore`] is the binary
//! asset store. Neither knows about the other: keeping player records and
//! blobs in step is the job of the profile and account layers.

pub mod blobs;
pub mod database;
pub mod paths;
pub mod records;

pub use blobs::{Blob, BlobMeta, BlobStore};
pub use database::{ArcadeDatabase, LeaderboardRow};
pub use paths::StoragePaths;
pub use records::{AvatarRef, GameScore, Player, ScoreCard, ScoreOutcome};
