use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};
use serde::{Deserialize, Serialize};

use super::rate_limit_backend::RateLimitError;
use crate::domain::value_objects::LimitType;

/// Raw answer of a distributed sliding-window limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidingWindowResponse {
    pub success: bool,
    pub limit: i64,
    pub remaining: i64,
    /// Unix timestamp in milliseconds
    pub reset: i64,
}

/// Port for an external distributed limiter (e.g. a Redis-backed service).
///
/// The limiter owns its own per-limit-type window configuration.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SlidingWindowClient: Send + Sync {
    async fn limit(
        &self,
        limit_type: LimitType,
        identifier: &str,
    ) -> Result<SlidingWindowResponse, RateLimitError>;

    async fn reset(&self, limit_type: LimitType, identifier: &str) -> Result<(), RateLimitError>;
}
