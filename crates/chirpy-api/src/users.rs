use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use tracing::info;

use chirpy_types::api::{CredentialsRequest, USER_UPGRADED_EVENT, WebhookRequest};
use chirpy_types::models::User;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::with_db;

pub async fn create_user(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<CredentialsRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user = with_db(&state, move |db| db.create_user(&req.email, &req.password)).await?;

    Ok((StatusCode::CREATED, Json(User::from(&user))))
}

/// Replace the caller's own email and password.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<CredentialsRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user = with_db(&state, move |db| {
        db.update_user(user_id, &req.email, &req.password)
    })
    .await?;

    Ok(Json(User::from(&user)))
}

/// Payment provider callback. The service API key is checked by
/// [`require_api_key`](crate::middleware::require_api_key) before the body is parsed.
pub async fn upgrade_webhook(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<WebhookRequest>, ApiError>,
) -> Result<Response, ApiError> {
    if req.event != USER_UPGRADED_EVENT {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let user_id = req.data.user_id;
    let user = with_db(&state, move |db| db.upgrade_user(user_id)).await?;
    info!("User {} upgraded to Chirpy Red", user.id);

    Ok(Json(User::from(&user)).into_response())
}
