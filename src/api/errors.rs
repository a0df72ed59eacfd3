use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::value_objects::RateLimitResult;

pub const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// API error response
pub struct ApiError {
    status: StatusCode,
    message: String,
    errors: Vec<String>,
    headers: HeaderMap,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: Vec::new(),
            headers: HeaderMap::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Rejected submission, with one entry per failed check
    pub fn validation_failed(errors: Vec<String>) -> Self {
        Self {
            errors,
            ..Self::bad_request("Validation failed")
        }
    }

    pub fn payload_too_large(max_bytes: usize) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Request body exceeds {} bytes", max_bytes),
        )
    }

    /// 429 carrying `Retry-After` and the rate-limit headers
    pub fn too_many_requests(result: &RateLimitResult, now: DateTime<Utc>) -> Self {
        let mut headers = rate_limit_headers(result);
        headers.insert(
            header::RETRY_AFTER,
            HeaderValue::from(result.retry_after_secs(now)),
        );
        Self {
            headers,
            ..Self::new(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// `X-RateLimit-Limit`, `X-RateLimit-Remaining` and `X-RateLimit-Reset` (unix seconds)
pub fn rate_limit_headers(result: &RateLimitResult) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(result.limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(result.remaining));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(result.reset.timestamp()));
    headers
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = if self.errors.is_empty() {
            json!({ "error": self.message })
        } else {
            json!({ "error": self.message, "errors": self.errors })
        };

        (self.status, self.headers, Json(body)).into_response()
    }
}
