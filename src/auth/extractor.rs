// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the acting player.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::AuthError;
use crate::state::AppState;
use crate::storage::records::validate_username;

/// Header carrying the signed-in player's username.
pub const PLAYER_HEADER: &str = "x-arcade-player";

/// Username of the player the request acts for.
///
/// Only the header's shape is checked; whether the player exists is up to the
/// operation being called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingPlayer(pub String);

impl FromRequestParts<AppState> for ActingPlayer {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(PLAYER_HEADER)
            .ok_or(AuthError::MissingPlayerHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidPlayerHeader)?
            .trim();

        validate_username(username).map_err(|_| AuthError::InvalidPlayerHeader)?;
        Ok(ActingPlayer(username.to_string()))
    }
}
