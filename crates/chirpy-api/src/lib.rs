pub mod auth;
pub mod chirps;
pub mod error;
pub mod middleware;
pub mod users;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use tracing::error;

use chirpy_db::Database;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;

use crate::middleware::{require_api_key, require_auth};

/// Build the full `/api` router around a shared state.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/healthz", get(health))
        .route("/api/users", post(users::create_user))
        .route("/api/login", post(auth::login))
        .route("/api/refresh", post(auth::refresh))
        .route("/api/revoke", post(auth::revoke))
        .route("/api/chirps", get(chirps::list_chirps))
        .route("/api/chirps/{chirp_id}", get(chirps::get_chirp))
        .with_state(state.clone());

    let webhook_routes = Router::new()
        .route("/api/polka/webhooks", post(users::upgrade_webhook))
        .route_layer(from_fn_with_state(state.clone(), require_api_key))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/users", put(users::update_user))
        .route("/api/chirps", post(chirps::create_chirp))
        .route("/api/chirps/{chirp_id}", delete(chirps::delete_chirp))
        .layer(from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(webhook_routes)
        .merge(protected_routes)
}

async fn health() -> &'static str {
    "OK"
}

/// Run a blocking store call off the async runtime.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> chirpy_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
