use chrono::{Duration, Utc};
use tracing::{debug, warn};

use chirpy_auth::{hash_password, verify_password};
use chirpy_types::Id;

use crate::Database;
use crate::error::{Result, StoreError};
use crate::models::{ChirpRecord, RefreshTokenSlot, UserRecord, next_id};

impl Database {
    // -- Chirps --

    pub fn create_chirp(&self, body: &str, author_id: Id) -> Result<ChirpRecord> {
        self.with_doc_mut(|doc| {
            let id = next_id(&doc.chirps);
            let chirp = ChirpRecord {
                id,
                body: body.to_string(),
                author_id,
            };

            if doc.chirps.insert(id, chirp.clone()).is_some() {
                warn!("Chirp id {} reused; previous chirp overwritten", id);
            }
            debug!("Created chirp {} by user {}", id, author_id);
            Ok(chirp)
        })
    }

    /// All chirps, in no particular order.
    pub fn get_chirps(&self) -> Result<Vec<ChirpRecord>> {
        self.with_doc(|doc| Ok(doc.chirps.values().cloned().collect()))
    }

    pub fn get_chirp(&self, id: Id) -> Result<ChirpRecord> {
        self.with_doc(|doc| {
            doc.chirps
                .get(&id)
                .cloned()
                .ok_or(StoreError::NotFound("chirp"))
        })
    }

    /// Delete a chirp on behalf of `requester_id`, who must be its author.
    pub fn delete_chirp(&self, id: Id, requester_id: Id) -> Result<()> {
        self.with_doc_mut(|doc| {
            let chirp = doc.chirps.get(&id).ok_or(StoreError::NotFound("chirp"))?;
            if chirp.author_id != requester_id {
                return Err(StoreError::Forbidden("chirp"));
            }

            doc.chirps.remove(&id);
            debug!("Deleted chirp {} by user {}", id, requester_id);
            Ok(())
        })
    }

    // -- Users --

    pub fn create_user(&self, email: &str, password: &str) -> Result<UserRecord> {
        // Hash outside the write lock.
        let password_hash = hash_password(password)?;

        self.with_doc_mut(|doc| {
            if doc.find_user_by_email(email).is_some() {
                return Err(StoreError::Conflict(format!(
                    "a user with email {email} already exists"
                )));
            }

            let id = next_id(&doc.users);
            let user = UserRecord {
                id,
                email: email.to_string(),
                password_hash,
                is_upgraded: false,
                refresh_token: RefreshTokenSlot::default(),
            };

            doc.users.insert(id, user.clone());
            debug!("Created user {}", id);
            Ok(user)
        })
    }

    pub fn get_user(&self, id: Id) -> Result<UserRecord> {
        self.with_doc(|doc| {
            doc.users
                .get(&id)
                .cloned()
                .ok_or(StoreError::NotFound("user"))
        })
    }

    /// Overwrite email and password. Email uniqueness is not re-checked.
    pub fn update_user(&self, id: Id, new_email: &str, new_password: &str) -> Result<UserRecord> {
        let password_hash = hash_password(new_password)?;

        self.with_doc_mut(|doc| {
            let user = doc.users.get_mut(&id).ok_or(StoreError::NotFound("user"))?;
            user.email = new_email.to_string();
            user.password_hash = password_hash;

            debug!("Updated user {}", id);
            Ok(user.clone())
        })
    }

    pub fn upgrade_user(&self, id: Id) -> Result<UserRecord> {
        self.with_doc_mut(|doc| {
            let user = doc.users.get_mut(&id).ok_or(StoreError::NotFound("user"))?;
            user.is_upgraded = true;

            debug!("Upgraded user {}", id);
            Ok(user.clone())
        })
    }

    /// Look up a user by email and check the password.
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub fn login(&self, email: &str, password: &str) -> Result<UserRecord> {
        let user = self.with_doc(|doc| Ok(doc.find_user_by_email(email).cloned()))?;

        match user {
            Some(user) if verify_password(&user.password_hash, password) => Ok(user),
            _ => {
                debug!("Login rejected for {}", email);
                Err(StoreError::Unauthorized)
            }
        }
    }

    // -- Refresh tokens --

    /// Put `token` in the user's single refresh-token slot, replacing whatever was there.
    pub fn store_refresh_token(&self, user_id: Id, token: &str, ttl: Duration) -> Result<()> {
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(StoreError::LifetimeOutOfRange)?;

        self.with_doc_mut(|doc| {
            let user = doc
                .users
                .get_mut(&user_id)
                .ok_or(StoreError::NotFound("user"))?;
            user.refresh_token = RefreshTokenSlot {
                token: token.to_string(),
                expires_at: Some(expires_at),
            };

            debug!("Stored refresh token for user {}", user_id);
            Ok(())
        })
    }

    /// Resolve a refresh token to its owner. Expired tokens are rejected.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Id> {
        if token.is_empty() {
            return Err(StoreError::Unauthorized);
        }

        let now = Utc::now();
        self.with_doc(|doc| {
            let user = doc
                .users
                .values()
                .find(|u| u.refresh_token.token == token)
                .ok_or(StoreError::Unauthorized)?;

            if user.refresh_token.is_expired_at(now) {
                debug!("Refresh token for user {} has expired", user.id);
                return Err(StoreError::Unauthorized);
            }
            Ok(user.id)
        })
    }

    pub fn revoke_refresh_token(&self, token: &str) -> Result<()> {
        self.with_doc_mut(|doc| {
            let user = doc
                .find_user_by_refresh_token_mut(token)
                .ok_or(StoreError::NotFound("refresh token"))?;
            user.refresh_token.clear();

            debug!("Revoked refresh token for user {}", user.id);
            Ok(())
        })
    }
}
