// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Acting Player
//!
//! The arcade server sits behind the portal's session layer, which
//! authenticates the browser and forwards the username of the signed-in
//! player in the `x-arcade-player` header. Handlers that act on behalf of a
//! player take the [`ActingPlayer`] extractor:
//!
//! ```rust,ignore
//! async fn my_handler(ActingPlayer(username): ActingPlayer) -> impl IntoResponse {
//!     // username has passed username validation
//! }
//! ```
//!
//! The header is trusted as-is; the server must not be reachable except
//! through the session layer.

pub mod error;
pub mod extractor;

pub use error::AuthError;
pub use extractor::{ActingPlayer, PLAYER_HEADER};
