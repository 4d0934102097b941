//! On-disk record types. These map one-to-one onto the JSON document.
//! Distinct from chirpy-types API models so the public views never leak hashes or tokens.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chirpy_types::Id;
use chirpy_types::models::{Chirp, User};

/// The whole database. Map keys are written as decimal strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub chirps: BTreeMap<Id, ChirpRecord>,
    #[serde(default)]
    pub users: BTreeMap<Id, UserRecord>,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.chirps.is_empty() && self.users.is_empty()
    }

    pub(crate) fn find_user_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.users.values().find(|u| u.email == email)
    }

    pub(crate) fn find_user_by_refresh_token_mut(&mut self, token: &str) -> Option<&mut UserRecord> {
        if token.is_empty() {
            return None;
        }
        self.users
            .values_mut()
            .find(|u| u.refresh_token.token == token)
    }
}

/// Next id for a table: current row count + 1.
///
/// Ids are not derived from the highest existing id, so deleting the newest
/// row and inserting again can land on a surviving row's id.
pub(crate) fn next_id<T>(table: &BTreeMap<Id, T>) -> Id {
    table.len() as Id + 1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChirpRecord {
    pub id: Id,
    pub body: String,
    #[serde(default)]
    pub author_id: Id,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Id,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(rename = "is_chirpy_red", default)]
    pub is_upgraded: bool,
    #[serde(flatten)]
    pub refresh_token: RefreshTokenSlot,
}

/// The single refresh token a user may hold. An empty `token` means none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenSlot {
    #[serde(rename = "refresh_token", default)]
    pub token: String,
    #[serde(
        rename = "refresh_token_expires_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

impl RefreshTokenSlot {
    /// Slots written without an expiry never lapse.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn clear(&mut self) {
        self.token.clear();
        self.expires_at = None;
    }
}

impl From<ChirpRecord> for Chirp {
    fn from(r: ChirpRecord) -> Self {
        Chirp {
            id: r.id,
            body: r.body,
            author_id: r.author_id,
        }
    }
}

impl From<&UserRecord> for User {
    fn from(r: &UserRecord) -> Self {
        User {
            id: r.id,
            email: r.email.clone(),
            is_chirpy_red: r.is_upgraded,
        }
    }
}
