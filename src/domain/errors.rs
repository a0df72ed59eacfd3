use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid rate limit policy: {0}")]
    InvalidPolicy(String),

    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),
}
