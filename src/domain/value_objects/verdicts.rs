use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of sanitizing one scalar value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizationResult {
    pub is_valid: bool,
    pub sanitized: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SanitizationResult {
    pub fn valid(sanitized: String) -> Self {
        Self {
            is_valid: true,
            sanitized,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            sanitized: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Verdict for one uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitized_name: Option<String>,
    pub security_score: u8,
}

impl FileValidationResult {
    /// Minimum score a file must keep to be accepted
    pub const PASSING_SCORE: u8 = 50;

    pub fn new(
        errors: Vec<String>,
        warnings: Vec<String>,
        sanitized_name: Option<String>,
        security_score: u8,
    ) -> Self {
        let security_score = security_score.min(100);
        Self {
            is_valid: errors.is_empty() && security_score >= Self::PASSING_SCORE,
            errors,
            warnings,
            sanitized_name,
            security_score,
        }
    }
}

/// Normalized answer of every rate-limit backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    pub success: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RateLimitResult {
    /// Admitted request; `count` is the number of requests used including this one
    pub fn allowed(limit: u32, count: u32, reset: DateTime<Utc>) -> Self {
        Self {
            success: true,
            limit,
            remaining: limit.saturating_sub(count),
            reset,
            error: None,
        }
    }

    pub fn denied(limit: u32, reset: DateTime<Utc>) -> Self {
        Self {
            success: false,
            limit,
            remaining: 0,
            reset,
            error: Some("Rate limit exceeded".to_string()),
        }
    }

    /// Whole seconds until the window resets, at least 1 when denied
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset - now).num_milliseconds().max(0) as u64;
        let secs = millis.div_ceil(1000);
        if self.success {
            secs
        } else {
            secs.max(1)
        }
    }
}
