// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::{ApiError, ArcadeResult},
    games::GameName,
    models::{
        AvatarForm, AvatarResponse, DisplayNameRequest, LoginRequest, LoginResponse,
        PasswordRequest, PlayerSummary, RecordScoreRequest, RecordScoreResponse,
        RegisterPlayerForm, ScoreCardResponse,
    },
    profile::Profile,
    ranking::RankedPlayer,
    state::AppState,
    storage::{GameScore, ScoreOutcome},
};

pub mod health;
pub mod multipart;
pub mod players;
pub mod profile;
pub mod scores;

/// Room for multipart boundaries and text fields on top of the avatar itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_avatar_bytes + FORM_OVERHEAD_BYTES;

    let v1_routes = Router::new()
        .route("/players", post(players::register_player))
        .route("/login", post(players::login))
        .route("/scores", post(scores::record_score))
        .route("/scores/{game}", get(scores::get_high_score))
        .route("/scorecard", get(scores::get_score_card))
        .route("/leaderboard", get(scores::leaderboard))
        .route("/profile", get(profile::get_profile))
        .route(
            "/profile/display-name",
            put(profile::change_display_name),
        )
        .route("/profile/password", put(profile::change_password))
        .route("/profile/avatar", put(profile::replace_avatar))
        .route("/avatars/{username}", get(profile::get_avatar))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run CPU-bound work (password hashing) off the async worker threads.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> ArcadeResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => Ok(result?),
        Err(e) => {
            tracing::error!(error = %e, "Blocking task failed");
            Err(ApiError::internal("Internal error"))
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        players::register_player,
        players::login,
        scores::record_score,
        scores::get_high_score,
        scores::get_score_card,
        scores::leaderboard,
        profile::get_profile,
        profile::change_display_name,
        profile::change_password,
        profile::replace_avatar,
        profile::get_avatar
    ),
    components(
        schemas(
            GameName,
            GameScore,
            ScoreOutcome,
            RankedPlayer,
            Profile,
            PlayerSummary,
            RegisterPlayerForm,
            LoginRequest,
            LoginResponse,
            RecordScoreRequest,
            RecordScoreResponse,
            ScoreCardResponse,
            DisplayNameRequest,
            PasswordRequest,
            AvatarForm,
            AvatarResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Players", description = "Registration and login"),
        (name = "Scores", description = "Score submission, scorecards and leaderboard"),
        (name = "Profile", description = "Display name, password and avatar")
    )
)]
struct ApiDoc;

#[cfg(test)]
pub(crate) mod test_support {
    use std::num::NonZeroU32;

    use tempfile::TempDir;

    use crate::accounts::NewPlayer;
    use crate::config::Config;
    use crate::state::AppState;

    /// State over a fresh data directory, with cheap password hashing.
    pub fn test_state() -> (TempDir, AppState) {
        let temp = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp.path().to_path_buf(),
            password_iterations: NonZeroU32::new(1).unwrap(),
            max_avatar_bytes: 1024,
            ..Config::default()
        };
        let state = AppState::open(config).unwrap();
        (temp, state)
    }

    /// Register a player whose password is "secret".
    pub fn register(state: &AppState, username: &str, display_name: &str) {
        state
            .accounts()
            .create_player(NewPlayer {
                username: username.to_string(),
                password_hash: state.hasher.hash("secret").unwrap(),
                display_name: display_name.to_string(),
                avatar: None,
            })
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PLAYER_HEADER;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use test_support::{register, test_state};
    use tower::ServiceExt;

    const BOUNDARY: &str = "arcade-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File(name, content_type, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"upload\"\r\n\
                             Content-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn multipart_request(method: &str, uri: &str, player: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(player) = player {
            builder = builder.header(PLAYER_HEADER, player);
        }
        builder.body(Body::from(multipart_body(parts))).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn run_blocking_maps_errors() {
        let value = run_blocking(|| Ok(7)).await.unwrap();
        assert_eq!(value, 7);

        let err = run_blocking::<(), _>(|| Err(crate::error::ArcadeError::validation("bad")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = run_blocking::<(), _>(|| panic!("worker died"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (_temp, state) = test_state();
        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn register_with_avatar_then_fetch_it() {
        let (_temp, state) = test_state();
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(multipart_request(
                "POST",
                "/v1/players",
                None,
                &[
                    Part::Text("username", "alice"),
                    Part::Text("password", "hunter2"),
                    Part::Text("display_name", "Alice"),
                    Part::File("avatar", "image/png", b"\x89PNG-alice"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["username"], "alice");
        assert_eq!(body["has_avatar"], true);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/avatars/alice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"\x89PNG-alice");

        assert_eq!(state.db.get_scorecard("alice").unwrap().unwrap().total_score, 0);
    }

    #[tokio::test]
    async fn duplicate_registration_is_409_without_orphan_blob() {
        let (_temp, state) = test_state();
        register(&state, "bob", "Bob");
        let app = router(state.clone());

        let response = app
            .oneshot(multipart_request(
                "POST",
                "/v1/players",
                None,
                &[
                    Part::Text("username", "bob"),
                    Part::Text("password", "pw"),
                    Part::Text("display_name", "Other Bob"),
                    Part::File("avatar", "image/webp", b"webp"),
                ],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("already taken"));
        assert!(state.blobs.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn avatar_replace_through_router() {
        let (_temp, state) = test_state();
        register(&state, "carol", "Carol");
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(multipart_request(
                "PUT",
                "/v1/profile/avatar",
                Some("carol"),
                &[Part::File("avatar", "image/jpeg", b"jpeg-bytes")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["content_type"], "image/jpeg");

        let response = app
            .oneshot(multipart_request(
                "PUT",
                "/v1/profile/avatar",
                Some("carol"),
                &[Part::File("avatar", "application/pdf", b"%PDF")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.blobs.list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn acting_player_header_is_required() {
        let (_temp, state) = test_state();
        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/v1/scorecard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_game_in_body_is_400_with_json_error() {
        let (_temp, state) = test_state();
        register(&state, "fay", "Fay");

        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/scores")
                    .header(PLAYER_HEADER, "fay")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"game":"tetris","score":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("unknown game"));
    }

    #[tokio::test]
    async fn login_through_router() {
        let (_temp, state) = test_state();
        register(&state, "gus", "Gus");

        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"gus","password":"secret"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["authenticated"], true);
    }

    #[tokio::test]
    async fn leaderboard_limit_zero_is_empty() {
        let (_temp, state) = test_state();
        register(&state, "hal", "Hal");

        let response = router(state)
            .oneshot(
                Request::builder()
                    .uri("/v1/leaderboard?limit=0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn score_submission_through_router() {
        let (_temp, state) = test_state();
        register(&state, "dave", "Dave");
        let app = router(state);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/scores")
                    .header(PLAYER_HEADER, "dave")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"game":"dino","score":42}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["outcome"]["result"], "first_score");
        assert_eq!(body["total_score"], 42);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/leaderboard?limit=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body[0]["username"], "dave");
        assert_eq!(body[0]["rank"], 1);
    }
}
