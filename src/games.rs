// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Known mini-games.
//!
//! Scores can only be recorded against one of these identifiers; anything
//! else is rejected before the ledger is touched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ArcadeError;

/// Identifier of a mini-game hosted by the portal.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum GameName {
    Simon,
    Snake,
    Card,
    Dino,
    Flappy,
}

impl GameName {
    /// Every game, in dashboard order.
    pub const ALL: [GameName; 5] = [
        GameName::Simon,
        GameName::Snake,
        GameName::Card,
        GameName::Dino,
        GameName::Flappy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameName::Simon => "simon",
            GameName::Snake => "snake",
            GameName::Card => "card",
            GameName::Dino => "dino",
            GameName::Flappy => "flappy",
        }
    }
}

impl fmt::Display for GameName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameName {
    type Err = ArcadeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameName::ALL
            .into_iter()
            .find(|game| game.as_str() == s)
            .ok_or_else(|| ArcadeError::validation(format!("unknown game '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_game() {
        for game in GameName::ALL {
            assert_eq!(game.as_str().parse::<GameName>().unwrap(), game);
        }
    }

    #[test]
    fn rejects_unknown_game() {
        let err = "tetris".parse::<GameName>().unwrap_err();
        assert!(matches!(err, ArcadeError::Validation(_)));
        // Names are case-sensitive, matching the client identifiers.
        assert!("Snake".parse::<GameName>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_identifiers() {
        let json = serde_json::to_string(&GameName::Flappy).unwrap();
        assert_eq!(json, "\"flappy\"");
        let parsed: GameName = serde_json::from_str("\"dino\"").unwrap();
        assert_eq!(parsed, GameName::Dino);
        assert!(serde_json::from_str::<GameName>("\"pong\"").is_err());
    }
}
