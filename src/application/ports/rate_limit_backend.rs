use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;

use crate::domain::value_objects::{Environment, LimitType, RateLimitResult};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    #[error("Rate limit backend unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limit backend failure: {0}")]
    Backend(String),

    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    #[error("Rate limit reset is disabled in {0}")]
    Forbidden(Environment),
}

/// Strategy for storing and checking rate-limit counters
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RateLimitBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Count one request for `identifier` and decide whether it is admitted
    async fn check(
        &self,
        identifier: &str,
        limit_type: LimitType,
    ) -> Result<RateLimitResult, RateLimitError>;

    /// Drop counters for one identifier, for a single limit type or all of them
    async fn clear(
        &self,
        identifier: &str,
        limit_type: Option<LimitType>,
    ) -> Result<(), RateLimitError>;

    /// Drop every counter
    async fn clear_all(&self) -> Result<(), RateLimitError>;
}
