use shortlink_core::{CoreError, StorageError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LinkError>;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid expires_at: {0}")]
    InvalidExpiration(String),
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("short link not found")]
    NotFound,
    #[error("short link has expired")]
    Expired,
    #[error("failed to generate a unique short code after {attempts} attempts")]
    CodeGenerationExhausted { attempts: u32 },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LinkError {
    /// Caller input was rejected before anything was written.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LinkError::InvalidUrl(_) | LinkError::InvalidExpiration(_) | LinkError::InvalidShortCode(_)
        )
    }
}

impl From<CoreError> for LinkError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidUrl(msg) => LinkError::InvalidUrl(msg),
            CoreError::InvalidExpiration(msg) => LinkError::InvalidExpiration(msg),
            CoreError::InvalidShortCode(msg) => LinkError::InvalidShortCode(msg),
        }
    }
}
