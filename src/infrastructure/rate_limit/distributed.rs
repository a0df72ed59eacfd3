use async_trait::async_trait;
use chrono::DateTime;
use std::sync::Arc;

use crate::application::ports::{
    RateLimitBackend, RateLimitError, SlidingWindowClient, SlidingWindowResponse,
};
use crate::domain::value_objects::{LimitType, RateLimitResult};

/// Adapter from an external sliding-window limiter to [`RateLimitBackend`]
#[derive(Clone)]
pub struct DistributedRateLimitBackend {
    client: Arc<dyn SlidingWindowClient>,
}

impl DistributedRateLimitBackend {
    pub fn new(client: Arc<dyn SlidingWindowClient>) -> Self {
        Self { client }
    }

    fn normalize(response: SlidingWindowResponse) -> Result<RateLimitResult, RateLimitError> {
        let reset = DateTime::from_timestamp_millis(response.reset).ok_or_else(|| {
            RateLimitError::Backend(format!("invalid reset timestamp {}", response.reset))
        })?;
        let limit = clamp_u32(response.limit);
        let remaining = clamp_u32(response.remaining).min(limit);

        Ok(if response.success {
            RateLimitResult {
                success: true,
                limit,
                remaining,
                reset,
                error: None,
            }
        } else {
            RateLimitResult::denied(limit, reset)
        })
    }
}

fn clamp_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

#[async_trait]
impl RateLimitBackend for DistributedRateLimitBackend {
    fn name(&self) -> &'static str {
        "distributed"
    }

    async fn check(
        &self,
        identifier: &str,
        limit_type: LimitType,
    ) -> Result<RateLimitResult, RateLimitError> {
        let response = self.client.limit(limit_type, identifier).await?;
        Self::normalize(response)
    }

    async fn clear(
        &self,
        identifier: &str,
        limit_type: Option<LimitType>,
    ) -> Result<(), RateLimitError> {
        match limit_type {
            Some(limit_type) => self.client.reset(limit_type, identifier).await,
            None => {
                for limit_type in LimitType::ALL {
                    self.client.reset(limit_type, identifier).await?;
                }
                Ok(())
            }
        }
    }

    async fn clear_all(&self) -> Result<(), RateLimitError> {
        Err(RateLimitError::Unsupported {
            backend: "distributed",
            operation: "clear_all",
        })
    }
}
