use serde::{Deserialize, Serialize};

use crate::Id;

/// A chirp as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: Id,
    pub body: String,
    pub author_id: Id,
}

/// Public view of a user. Never carries the password hash or refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub is_chirpy_red: bool,
}
