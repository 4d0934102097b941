use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand_core::{OsRng, RngCore};

const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate an opaque refresh token: 256 random bits, URL-safe base64.
/// Uniqueness is probabilistic; nothing checks for collisions.
pub fn issue_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe_and_distinct() {
        let a = issue_refresh_token();
        let b = issue_refresh_token();

        assert_ne!(a, b);
        // 32 bytes -> 43 base64 chars without padding
        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}
