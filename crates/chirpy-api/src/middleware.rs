use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use chirpy_auth::{extract_api_key, extract_bearer_token, validate_session_token, verify_api_key};
use chirpy_types::Id;

use crate::auth::AppState;
use crate::error::ApiError;

/// The user a request was authenticated as, inserted by [`require_auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Id);

/// Extract and validate the session token from the Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(req.headers())?;

    let user_id = validate_session_token(&token, &state.jwt_secret).inspect_err(|e| {
        warn!("Rejected session token on {}: {}", req.uri().path(), e);
    })?;

    req.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(req).await)
}

/// Check the service API key before the request reaches its handler.
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = extract_api_key(req.headers())?;
    if !verify_api_key(&key, &state.polka_key) {
        warn!("Rejected API key on {}", req.uri().path());
        return Err(ApiError::Unauthorized("invalid API key".into()));
    }

    Ok(next.run(req).await)
}
