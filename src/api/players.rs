// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};

use super::{multipart::FormData, run_blocking};
use crate::{
    accounts::{AvatarUpload, LoginOutcome, NewPlayer},
    error::ApiError,
    models::{LoginRequest, LoginResponse, PlayerSummary, RegisterPlayerForm},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/players",
    request_body(content = RegisterPlayerForm, content_type = "multipart/form-data"),
    tag = "Players",
    responses(
        (status = 201, body = PlayerSummary),
        (status = 400, description = "Invalid username, display name, password or avatar"),
        (status = 409, description = "Username or display name already taken")
    )
)]
pub async fn register_player(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PlayerSummary>), ApiError> {
    let mut form = FormData::read(multipart, &["avatar"]).await?;

    let avatar = match form.take_file("avatar") {
        Some(file) => Some(AvatarUpload {
            content_type: file.require_content_type()?.to_string(),
            bytes: file.bytes,
        }),
        None => None,
    };
    let hasher = state.hasher.clone();
    let password = form.text("password")?.to_string();
    let password_hash = run_blocking(move || hasher.hash(&password)).await?;

    let player = state.accounts().create_player(NewPlayer {
        username: form.text("username")?.to_string(),
        password_hash,
        display_name: form.text("display_name")?.to_string(),
        avatar,
    })?;

    Ok((StatusCode::CREATED, Json(player.into())))
}

#[utoipa::path(
    post,
    path = "/v1/login",
    request_body = LoginRequest,
    tag = "Players",
    responses(
        (status = 200, body = LoginResponse),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request_username = request.username.clone();
    let outcome = run_blocking(move || {
        state
            .accounts()
            .validate_login(&state.hasher, &request.username, &request.password)
    })
    .await?;

    match outcome {
        LoginOutcome::Authenticated => Ok(Json(LoginResponse {
            username: request_username,
            authenticated: true,
        })),
        LoginOutcome::WrongPassword => Err(ApiError::unauthorized("Wrong password")),
        LoginOutcome::UnknownPlayer => Err(ApiError::not_found(format!(
            "Player {request_username} not found"
        ))),
    }
}
