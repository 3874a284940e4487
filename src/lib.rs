// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Arcade Server - Score Ledger & Player Profile Service
//!
//! Record-keeping backend for the mini-game portal: per-game high scores, an
//! aggregate leaderboard, and player profiles with avatar storage.
//!
//! ## Modules
//!
//! - `ledger` - Score submission and scorecards
//! - `ranking` - Leaderboard over total scores
//! - `profile` - Display name, password and avatar changes
//! - `accounts` - Registration, login check, repair paths
//! - `storage` - redb document store and filesystem blob store
//! - `api` - HTTP API handlers (Axum)

pub mod accounts;
pub mod api;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod games;
pub mod janitor;
pub mod ledger;
pub mod models;
pub mod profile;
pub mod ranking;
pub mod state;
pub mod storage;
