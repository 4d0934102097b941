use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::Duration;
use tracing::warn;

use chirpy_auth::{extract_bearer_token, issue_refresh_token, issue_session_token};
use chirpy_db::Database;
use chirpy_types::api::{LoginRequest, LoginResponse, RefreshResponse};

use crate::error::ApiError;
use crate::with_db;

/// Session tokens live at most an hour; that is also the default.
pub const MAX_SESSION_TTL_SECS: i64 = 60 * 60;

pub const REFRESH_TOKEN_TTL_DAYS: i64 = 60;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub polka_key: String,
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let LoginRequest {
        email,
        password,
        expires_in_seconds,
    } = req;

    let user = with_db(&state, move |db| db.login(&email, &password)).await?;

    let token = issue_session_token(user.id, &state.jwt_secret, session_ttl(expires_in_seconds))?;

    let refresh_token = issue_refresh_token();
    let stored = refresh_token.clone();
    let user_id = user.id;
    with_db(&state, move |db| {
        db.store_refresh_token(user_id, &stored, Duration::days(REFRESH_TOKEN_TTL_DAYS))
    })
    .await?;

    Ok(Json(LoginResponse {
        id: user.id,
        email: user.email,
        is_chirpy_red: user.is_upgraded,
        token,
        refresh_token,
    }))
}

/// Exchange a refresh token for a fresh session token.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = extract_bearer_token(&headers)?;

    let user_id = with_db(&state, move |db| db.validate_refresh_token(&refresh_token))
        .await
        .inspect_err(|_| warn!("Refresh rejected"))?;

    let token = issue_session_token(
        user_id,
        &state.jwt_secret,
        Duration::seconds(MAX_SESSION_TTL_SECS),
    )?;

    Ok(Json(RefreshResponse { token }))
}

pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = extract_bearer_token(&headers)?;

    with_db(&state, move |db| db.revoke_refresh_token(&refresh_token)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Requested lifetime, clamped to `(0, MAX_SESSION_TTL_SECS]`.
/// Missing or non-positive requests get the maximum.
fn session_ttl(requested: Option<i64>) -> Duration {
    let secs = match requested {
        Some(s) if s > 0 => s.min(MAX_SESSION_TTL_SECS),
        _ => MAX_SESSION_TTL_SECS,
    };
    Duration::seconds(secs)
}
