// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Error Types
//!
//! Two layers:
//!
//! - [`ArcadeError`] is returned by every core operation (ledger, ranking,
//!   profile, accounts). Its variants are the record-keeping taxonomy:
//!   `NotFound`, `Conflict`, `Validation`, and `Store` for persistence failures.
//! - [`ApiError`] is the HTTP rendering of an error, produced by handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

// =============================================================================
// Persistence Errors
// =============================================================================

/// Failure of the underlying document store or blob store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes no longer match their recorded digest.
    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("system randomness unavailable")]
    Randomness,
}

// =============================================================================
// Core Errors
// =============================================================================

/// Error returned by the score ledger, ranking engine, profile manager and
/// account operations.
#[derive(Debug, thiserror::Error)]
pub enum ArcadeError {
    /// Referenced player, scorecard or avatar does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Username or display name is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Input rejected before touching storage.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ArcadeError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }

    pub fn validation(what: impl Into<String>) -> Self {
        Self::Validation(what.into())
    }
}

macro_rules! store_error_into_arcade {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ArcadeError {
                fn from(e: $ty) -> Self {
                    ArcadeError::Store(StoreError::from(e))
                }
            }
        )*
    };
}

store_error_into_arcade!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
    serde_json::Error,
    std::io::Error,
);

pub type ArcadeResult<T> = Result<T, ArcadeError>;

// =============================================================================
// HTTP Errors
// =============================================================================

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<ArcadeError> for ApiError {
    fn from(err: ArcadeError) -> Self {
        match err {
            ArcadeError::NotFound(what) => ApiError::not_found(format!("{what} not found")),
            ArcadeError::Conflict(what) => ApiError::conflict(format!("{what} is already taken")),
            ArcadeError::Validation(msg) => ApiError::bad_request(msg),
            ArcadeError::Store(e) => {
                // Storage internals stay in the logs.
                tracing::error!(error = %e, "Storage failure while handling request");
                ApiError::internal("Internal storage error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
