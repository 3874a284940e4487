// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use super::{multipart::FormData, run_blocking};
use crate::{
    auth::ActingPlayer,
    error::ApiError,
    models::{AvatarForm, AvatarResponse, DisplayNameRequest, PasswordRequest},
    profile::Profile,
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v1/profile",
    tag = "Profile",
    responses(
        (status = 200, body = Profile),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn get_profile(
    ActingPlayer(username): ActingPlayer,
    State(state): State<AppState>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.profiles().get_profile(&username)?))
}

#[utoipa::path(
    put,
    path = "/v1/profile/display-name",
    request_body = DisplayNameRequest,
    tag = "Profile",
    responses(
        (status = 204),
        (status = 404, description = "Unknown player"),
        (status = 409, description = "Display name already taken")
    )
)]
pub async fn change_display_name(
    ActingPlayer(username): ActingPlayer,
    State(state): State<AppState>,
    Json(request): Json<DisplayNameRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .profiles()
        .change_display_name(&username, &request.display_name)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/v1/profile/password",
    request_body = PasswordRequest,
    tag = "Profile",
    responses(
        (status = 204),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn change_password(
    ActingPlayer(username): ActingPlayer,
    State(state): State<AppState>,
    Json(request): Json<PasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let hasher = state.hasher.clone();
    let new_hash = run_blocking(move || hasher.hash(&request.password)).await?;
    state.profiles().change_password(&username, new_hash)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/v1/profile/avatar",
    request_body(content = AvatarForm, content_type = "multipart/form-data"),
    tag = "Profile",
    responses(
        (status = 200, body = AvatarResponse),
        (status = 400, description = "Missing, empty, oversized or non-image avatar"),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn replace_avatar(
    ActingPlayer(username): ActingPlayer,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AvatarResponse>, ApiError> {
    let mut form = FormData::read(multipart, &["avatar"]).await?;
    let file = form
        .take_file("avatar")
        .ok_or_else(|| ApiError::bad_request("Missing form field 'avatar'"))?;
    let content_type = file.require_content_type()?;

    let avatar = state
        .profiles()
        .replace_avatar(&username, &file.bytes, content_type)?;

    Ok(Json(AvatarResponse {
        blob_id: avatar.blob_id,
        content_type: avatar.content_type,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/avatars/{username}",
    params(
        ("username" = String, Path, description = "Player whose avatar to fetch")
    ),
    tag = "Profile",
    responses(
        (status = 200, description = "Avatar image bytes"),
        (status = 404, description = "Unknown player or no avatar")
    )
)]
pub async fn get_avatar(
    Path(username): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let avatar = state.profiles().get_avatar(&username)?;
    Ok(([(header::CONTENT_TYPE, avatar.content_type)], avatar.bytes))
}
