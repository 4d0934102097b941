use serde::{Deserialize, Serialize};

use crate::Id;

// -- JWT Claims --

/// Session token claims. The subject is the user id in its decimal string form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
}

// -- Users --

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: Id,
    pub email: String,
    pub is_chirpy_red: bool,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

// -- Chirps --

#[derive(Debug, Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than `desc` sorts ascending.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }
}

// -- Webhooks --

pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub user_id: Id,
}
