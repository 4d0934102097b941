//! Chirpy credential codec
//!
//! Everything needed to turn secrets into verifiable artifacts and back:
//! - Argon2id password hashes
//! - HS256 session tokens carrying the user id
//! - opaque refresh tokens
//! - `Authorization` header parsing for bearer tokens and the service API key
//!
//! Nothing here touches storage.

pub mod error;
pub mod headers;
pub mod password;
pub mod refresh;
pub mod token;

pub use error::AuthError;
pub use headers::{extract_api_key, extract_bearer_token, verify_api_key};
pub use password::{hash_password, verify_password};
pub use refresh::issue_refresh_token;
pub use token::{issue_session_token, validate_session_token};
