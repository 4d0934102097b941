use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use chirpy_types::Id;
use chirpy_types::api::Claims;

use crate::error::{AuthError, Result};

pub const ISSUER: &str = "chirpy";

/// Mint an HS256 session token for `user_id`, valid from now until now + `ttl`.
///
/// Fails with [`AuthError::LifetimeOutOfRange`] if now + `ttl` overflows or
/// lands before the Unix epoch.
pub fn issue_session_token(user_id: Id, secret: &str, ttl: Duration) -> Result<String> {
    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(ttl)
        .ok_or(AuthError::LifetimeOutOfRange)?;

    let claims = Claims {
        iss: ISSUER.to_string(),
        sub: user_id.to_string(),
        iat: unix_seconds(now.timestamp())?,
        exp: unix_seconds(expires_at.timestamp())?,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn unix_seconds(timestamp: i64) -> Result<u64> {
    u64::try_from(timestamp).map_err(|_| AuthError::LifetimeOutOfRange)
}

/// Verify a session token and return the user id it was issued for.
///
/// Bad signature, wrong issuer, expiry and a missing or non-numeric subject
/// all collapse into [`AuthError::Invalid`].
pub fn validate_session_token(token: &str, secret: &str) -> Result<Id> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        debug!("Session token rejected: {}", e);
        AuthError::Invalid
    })?;

    data.claims.sub.parse::<Id>().map_err(|_| {
        debug!("Session token subject is not a user id: {:?}", data.claims.sub);
        AuthError::Invalid
    })
}
