use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::ports::{RateLimitBackend, RateLimitError};
use crate::domain::value_objects::{Environment, LimitType, RateLimitPolicies, RateLimitResult};

/// Dual-mode rate limiter.
///
/// Requests go to the primary (distributed) backend when one is configured;
/// any error from it is logged and the request is counted by the local
/// fallback instead, so callers only ever see a [`RateLimitResult`].
#[derive(Clone)]
pub struct RateLimiter {
    primary: Option<Arc<dyn RateLimitBackend>>,
    fallback: Arc<dyn RateLimitBackend>,
    /// Reported when every backend fails and the request is admitted anyway
    policies: RateLimitPolicies,
    environment: Environment,
}

impl RateLimiter {
    /// Limiter backed only by `fallback`
    pub fn local(fallback: Arc<dyn RateLimitBackend>, environment: Environment) -> Self {
        Self {
            primary: None,
            fallback,
            policies: RateLimitPolicies::default(),
            environment,
        }
    }

    /// Policies the backends were configured with
    pub fn with_policies(mut self, policies: RateLimitPolicies) -> Self {
        self.policies = policies;
        self
    }

    /// Prefer `primary`, falling back on error
    pub fn with_primary(mut self, primary: Arc<dyn RateLimitBackend>) -> Self {
        self.primary = Some(primary);
        self
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Name of the backend requests are sent to first
    pub fn active_backend(&self) -> &'static str {
        self.primary
            .as_ref()
            .map_or_else(|| self.fallback.name(), |p| p.name())
    }

    /// Count one request. Never fails: backend errors degrade to local limiting.
    pub async fn check_limit(&self, identifier: &str, limit_type: LimitType) -> RateLimitResult {
        if let Some(primary) = &self.primary {
            match primary.check(identifier, limit_type).await {
                Ok(result) => return self.observe(result, identifier, limit_type),
                Err(e) => warn!(
                    backend = primary.name(),
                    error = %e,
                    limit_type = limit_type.as_str(),
                    "Rate limit backend failed, using {} fallback",
                    self.fallback.name()
                ),
            }
        }

        match self.fallback.check(identifier, limit_type).await {
            Ok(result) => self.observe(result, identifier, limit_type),
            Err(e) => {
                // Fail open: an unusable limiter must not lock every client out
                warn!(error = %e, "Fallback rate limit backend failed, admitting request");
                let policy = self.policies.policy_for(limit_type);
                let now = chrono::Utc::now();
                let reset = now.checked_add_signed(policy.window_delta()).unwrap_or(now);
                RateLimitResult::allowed(policy.max(), 0, reset)
            }
        }
    }

    /// Resolve a caller-supplied limit type name, then count one request
    pub async fn check_limit_named(&self, identifier: &str, limit_type: &str) -> RateLimitResult {
        self.check_limit(identifier, LimitType::from_name(limit_type))
            .await
    }

    fn observe(
        &self,
        result: RateLimitResult,
        identifier: &str,
        limit_type: LimitType,
    ) -> RateLimitResult {
        if !result.success {
            debug!(
                identifier,
                limit_type = limit_type.as_str(),
                reset = %result.reset,
                "Request rate limited"
            );
        }
        result
    }

    /// Reset counters for one identifier. Refused in production.
    pub async fn clear_limit(
        &self,
        identifier: &str,
        limit_type: Option<LimitType>,
    ) -> Result<(), RateLimitError> {
        self.ensure_admin_allowed()?;
        if let Some(primary) = &self.primary {
            if let Err(e) = primary.clear(identifier, limit_type).await {
                warn!(backend = primary.name(), error = %e, "Failed to clear distributed limit");
            }
        }
        self.fallback.clear(identifier, limit_type).await
    }

    /// Reset every counter. Refused in production.
    pub async fn clear_all_limits(&self) -> Result<(), RateLimitError> {
        self.ensure_admin_allowed()?;
        if let Some(primary) = &self.primary {
            if let Err(e) = primary.clear_all().await {
                warn!(backend = primary.name(), error = %e, "Failed to clear distributed limits");
            }
        }
        self.fallback.clear_all().await
    }

    fn ensure_admin_allowed(&self) -> Result<(), RateLimitError> {
        if self.environment.allows_admin_reset() {
            Ok(())
        } else {
            warn!(environment = %self.environment, "Refused rate limit reset");
            Err(RateLimitError::Forbidden(self.environment))
        }
    }
}
