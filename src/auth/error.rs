// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Acting-player extraction errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// No `x-arcade-player` header present
    MissingPlayerHeader,
    /// Header is not valid UTF-8 or not a valid username
    InvalidPlayerHeader,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingPlayerHeader => "missing_player_header",
            AuthError::InvalidPlayerHeader => "invalid_player_header",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingPlayerHeader => write!(f, "x-arcade-player header is required"),
            AuthError::InvalidPlayerHeader => {
                write!(f, "x-arcade-player header does not hold a valid username")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
