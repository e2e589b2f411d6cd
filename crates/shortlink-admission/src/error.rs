use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdmissionError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("too many requests")]
    RateLimited,
    #[error("invalid rate limit config: {0}")]
    InvalidConfig(String),
}
