use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::errors::DomainError;

/// Category of action being rate limited; each has its own policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum LimitType {
    #[default]
    FormSubmission,
    Authentication,
    AuthenticationFailed,
    FileUpload,
    AdminAction,
    Strict,
}

impl LimitType {
    pub const ALL: [LimitType; 6] = [
        LimitType::FormSubmission,
        LimitType::Authentication,
        LimitType::AuthenticationFailed,
        LimitType::FileUpload,
        LimitType::AdminAction,
        LimitType::Strict,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LimitType::FormSubmission => "formSubmission",
            LimitType::Authentication => "authentication",
            LimitType::AuthenticationFailed => "authenticationFailed",
            LimitType::FileUpload => "fileUpload",
            LimitType::AdminAction => "adminAction",
            LimitType::Strict => "strict",
        }
    }

    /// Resolve a caller-supplied name; unknown names fall back to `FormSubmission`
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::debug!(limit_type = name, "Unknown limit type, using formSubmission");
            LimitType::FormSubmission
        })
    }
}

impl std::fmt::Display for LimitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LimitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LimitType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Invalid limit type: {}", s))
    }
}

/// Fixed window size and request budget for one limit type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    max: u32,
    window: Duration,
}

impl RateLimitPolicy {
    /// Longest accepted window
    pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

    pub fn new(max: u32, window: Duration) -> Result<Self, DomainError> {
        if max == 0 {
            return Err(DomainError::InvalidPolicy(
                "max requests must be at least 1".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(DomainError::InvalidPolicy(
                "window must be non-zero".to_string(),
            ));
        }
        if window > Self::MAX_WINDOW {
            return Err(DomainError::InvalidPolicy(format!(
                "window must not exceed {} seconds",
                Self::MAX_WINDOW.as_secs()
            )));
        }
        Ok(Self { max, window })
    }

    const fn fixed(max: u32, window_secs: u64) -> Self {
        Self {
            max,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn window_delta(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::milliseconds(self.window.as_millis().min(i64::MAX as u128) as i64)
    }
}

/// Policy table, one entry per limit type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicies {
    policies: HashMap<LimitType, RateLimitPolicy>,
}

impl Default for RateLimitPolicies {
    fn default() -> Self {
        let policies = HashMap::from([
            (LimitType::FormSubmission, RateLimitPolicy::fixed(15, 60)),
            (LimitType::Authentication, RateLimitPolicy::fixed(3, 300)),
            (LimitType::AuthenticationFailed, RateLimitPolicy::fixed(2, 900)),
            (LimitType::FileUpload, RateLimitPolicy::fixed(15, 60)),
            (LimitType::AdminAction, RateLimitPolicy::fixed(20, 60)),
            (LimitType::Strict, RateLimitPolicy::fixed(2, 60)),
        ]);
        Self { policies }
    }
}

impl RateLimitPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the policy for one limit type
    pub fn with_policy(mut self, limit_type: LimitType, policy: RateLimitPolicy) -> Self {
        self.policies.insert(limit_type, policy);
        self
    }

    pub fn policy_for(&self, limit_type: LimitType) -> RateLimitPolicy {
        self.policies
            .get(&limit_type)
            .or_else(|| self.policies.get(&LimitType::FormSubmission))
            .copied()
            .unwrap_or(RateLimitPolicy::fixed(15, 60))
    }
}
