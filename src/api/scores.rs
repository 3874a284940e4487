// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::ActingPlayer,
    error::{ApiError, ArcadeError},
    games::GameName,
    models::{RecordScoreRequest, RecordScoreResponse, ScoreCardResponse},
    ranking::{RankedPlayer, DEFAULT_LIMIT},
    state::AppState,
    storage::GameScore,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaderboardQuery {
    /// Number of entries (0-100, default 10).
    pub limit: Option<usize>,
}

#[utoipa::path(
    post,
    path = "/v1/scores",
    request_body = RecordScoreRequest,
    tag = "Scores",
    responses(
        (status = 200, body = RecordScoreResponse),
        (status = 400, description = "Unknown game or total overflow"),
        (status = 404, description = "Player has no scorecard")
    )
)]
pub async fn record_score(
    ActingPlayer(username): ActingPlayer,
    State(state): State<AppState>,
    Json(request): Json<RecordScoreRequest>,
) -> Result<Json<RecordScoreResponse>, ApiError> {
    let game: GameName = request.game.parse()?;
    let receipt = state
        .ledger()
        .record_score(&username, game, request.score)?;

    Ok(Json(RecordScoreResponse {
        game,
        outcome: receipt.outcome,
        total_score: receipt.total_score,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/scores/{game}",
    params(
        ("game" = GameName, Path, description = "Game to read the high score for")
    ),
    tag = "Scores",
    responses(
        (status = 200, body = GameScore),
        (status = 400, description = "Unknown game")
    )
)]
pub async fn get_high_score(
    ActingPlayer(username): ActingPlayer,
    Path(game): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<GameScore>, ApiError> {
    let game: GameName = game.parse()?;
    let high_score = state.ledger().high_score(&username, game)?;
    Ok(Json(GameScore { game, high_score }))
}

#[utoipa::path(
    get,
    path = "/v1/scorecard",
    tag = "Scores",
    responses((status = 200, body = ScoreCardResponse))
)]
pub async fn get_score_card(
    ActingPlayer(username): ActingPlayer,
    State(state): State<AppState>,
) -> Result<Json<ScoreCardResponse>, ApiError> {
    match state.ledger().card(&username) {
        Ok(card) => Ok(Json(card.into())),
        Err(ArcadeError::NotFound(_)) => Ok(Json(ScoreCardResponse {
            username,
            total_score: 0,
            game_scores: Vec::new(),
        })),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    get,
    path = "/v1/leaderboard",
    params(LeaderboardQuery),
    tag = "Scores",
    responses((status = 200, body = [RankedPlayer]))
)]
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<Json<Vec<RankedPlayer>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    Ok(Json(state.ranking().top_players(limit)?))
}
