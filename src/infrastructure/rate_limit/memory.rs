use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::ports::{Clock, RateLimitBackend, RateLimitError};
use crate::domain::entities::{RateLimitRecord, RecordState};
use crate::domain::value_objects::{LimitType, RateLimitPolicies, RateLimitResult};

/// Process-local rate limiter.
///
/// Each `(limit type, identifier)` key owns one [`RateLimitRecord`]. The
/// read-check-increment runs while holding the key's shard lock, so
/// concurrent requests for one key cannot both slip under the limit.
/// Records past their grace period are dropped lazily on access, or in bulk
/// by [`purge_expired`](Self::purge_expired).
#[derive(Clone)]
pub struct MemoryRateLimitBackend {
    records: Arc<DashMap<String, RateLimitRecord>>,
    policies: Arc<RateLimitPolicies>,
    clock: Arc<dyn Clock>,
}

impl MemoryRateLimitBackend {
    pub fn new(policies: RateLimitPolicies, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            policies: Arc::new(policies),
            clock,
        }
    }

    fn key(limit_type: LimitType, identifier: &str) -> String {
        format!("{}:{}", limit_type.as_str(), identifier)
    }

    /// Count one request synchronously; the async trait method delegates here
    pub fn check_now(&self, identifier: &str, limit_type: LimitType) -> RateLimitResult {
        let policy = self.policies.policy_for(limit_type);
        let now = self.clock.now();

        let mut record = self
            .records
            .entry(Self::key(limit_type, identifier))
            .or_insert_with(|| RateLimitRecord::new(now, &policy));
        let result = record.check(now, &policy);

        if !result.success {
            debug!(
                identifier,
                limit_type = limit_type.as_str(),
                violations = record.violations(),
                "Rate limit exceeded"
            );
            if record.is_penalized() {
                warn!(
                    identifier,
                    limit_type = limit_type.as_str(),
                    violations = record.violations(),
                    reset = %record.reset_time(),
                    "Repeat offender, extending rate limit window"
                );
            }
        }
        result
    }

    /// Drop every record past its grace period; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.records.len();
        self.records
            .retain(|_, record| record.state_at(now) != RecordState::Evicted);
        before.saturating_sub(self.records.len())
    }

    /// Snapshot of one record, mostly for diagnostics and tests
    pub fn record(&self, identifier: &str, limit_type: LimitType) -> Option<RateLimitRecord> {
        self.records
            .get(&Self::key(limit_type, identifier))
            .map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RateLimitBackend for MemoryRateLimitBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn check(
        &self,
        identifier: &str,
        limit_type: LimitType,
    ) -> Result<RateLimitResult, RateLimitError> {
        Ok(self.check_now(identifier, limit_type))
    }

    async fn clear(
        &self,
        identifier: &str,
        limit_type: Option<LimitType>,
    ) -> Result<(), RateLimitError> {
        match limit_type {
            Some(limit_type) => {
                self.records.remove(&Self::key(limit_type, identifier));
            }
            None => {
                for limit_type in LimitType::ALL {
                    self.records.remove(&Self::key(limit_type, identifier));
                }
            }
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), RateLimitError> {
        self.records.clear();
        Ok(())
    }
}
