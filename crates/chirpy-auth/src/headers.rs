use http::{HeaderMap, header};
use sha2::{Digest, Sha256};

use crate::error::{AuthError, Result};

const BEARER_SCHEME: &str = "Bearer";
const API_KEY_SCHEME: &str = "ApiKey";

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String> {
    extract_scheme(headers, BEARER_SCHEME)
}

/// Pull the key out of `Authorization: ApiKey <key>`.
pub fn extract_api_key(headers: &HeaderMap) -> Result<String> {
    extract_scheme(headers, API_KEY_SCHEME)
}

/// Compare a presented API key with the configured one.
///
/// Both sides are hashed first so the comparison always walks 32 bytes
/// regardless of key length or where the first difference is.
pub fn verify_api_key(presented: &str, expected: &str) -> bool {
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn extract_scheme(headers: &HeaderMap, scheme: &str) -> Result<String> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::Missing)?
        .to_str()
        .map_err(|_| AuthError::Malformed)?;

    let (found, credential) = value.split_once(' ').ok_or(AuthError::Malformed)?;
    if found != scheme {
        return Err(AuthError::Malformed);
    }

    let credential = credential.trim();
    if credential.is_empty() {
        return Err(AuthError::Malformed);
    }

    Ok(credential.to_string())
}
