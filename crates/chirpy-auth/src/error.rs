use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("missing credential")]
    Missing,

    /// A credential header was present but not in the expected shape.
    #[error("malformed authorization header")]
    Malformed,

    /// The credential was presented but did not check out.
    #[error("invalid credential")]
    Invalid,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The requested lifetime puts the expiry outside the representable range.
    #[error("token lifetime out of range")]
    LifetimeOutOfRange,

    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// True for failures that should surface as 401 rather than 400 or 500.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Missing | Self::Invalid)
    }
}
