use chirpy_auth::AuthError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("not allowed to modify this {0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("invalid credentials")]
    Unauthorized,

    #[error("refresh token lifetime out of range")]
    LifetimeOutOfRange,

    // -- Fatal: the document file itself is unusable --
    #[error("document I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("document (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Credential(#[from] AuthError),

    #[error("document lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Failures of the store itself rather than of the caller's request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Serialization(_) | Self::Credential(_) | Self::LockPoisoned
        )
    }
}
