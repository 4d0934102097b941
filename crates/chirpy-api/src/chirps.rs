use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use chirpy_types::api::{CreateChirpRequest, SortOrder};
use chirpy_types::models::Chirp;
use chirpy_types::{Id, MAX_CHIRP_LENGTH};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::with_db;

const PROFANE_WORDS: &[&str] = &["kerfuffle", "sharbert", "fornax"];
const MASK: &str = "****";

#[derive(Debug, Deserialize)]
pub struct ChirpQuery {
    pub author_id: Option<String>,
    pub sort: Option<String>,
}

pub async fn create_chirp(
    State(state): State<AppState>,
    Extension(AuthUser(author_id)): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<CreateChirpRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let body = validate_chirp(&req.body)?;

    let chirp = with_db(&state, move |db| db.create_chirp(&body, author_id)).await?;

    Ok((StatusCode::CREATED, Json(Chirp::from(chirp))))
}

/// All chirps, optionally narrowed to one author, ordered by id.
pub async fn list_chirps(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ChirpQuery>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let author_id = query
        .author_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<Id>)
        .transpose()
        .map_err(|_| ApiError::BadRequest("author_id must be an integer".into()))?;
    let order = SortOrder::from_param(query.sort.as_deref());

    let rows = with_db(&state, |db| db.get_chirps()).await?;

    let chirps: Vec<Chirp> = rows.into_iter().map(Chirp::from).collect();
    Ok(Json(arrange(chirps, author_id, order)))
}

pub async fn get_chirp(
    State(state): State<AppState>,
    WithRejection(Path(chirp_id), _): WithRejection<Path<Id>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let chirp = with_db(&state, move |db| db.get_chirp(chirp_id)).await?;

    Ok(Json(Chirp::from(chirp)))
}

pub async fn delete_chirp(
    State(state): State<AppState>,
    WithRejection(Path(chirp_id), _): WithRejection<Path<Id>, ApiError>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    with_db(&state, move |db| db.delete_chirp(chirp_id, user_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Enforce the length limit and mask profanity.
pub fn validate_chirp(body: &str) -> Result<String, ApiError> {
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ApiError::BadRequest("Chirp is too long".into()));
    }
    Ok(clean_body(body))
}

/// Replace whole space-delimited profane words, case-insensitively.
/// Words with attached punctuation are left alone.
fn clean_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if PROFANE_WORDS.contains(&word.to_lowercase().as_str()) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn arrange(mut chirps: Vec<Chirp>, author_id: Option<Id>, order: SortOrder) -> Vec<Chirp> {
    if let Some(author_id) = author_id {
        chirps.retain(|c| c.author_id == author_id);
    }
    match order {
        SortOrder::Asc => chirps.sort_by_key(|c| c.id),
        SortOrder::Desc => chirps.sort_by(|a, b| b.id.cmp(&a.id)),
    }
    chirps
}
