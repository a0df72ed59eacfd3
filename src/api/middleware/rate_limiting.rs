use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::errors::{rate_limit_headers, ApiError};
use crate::application::ports::Clock;
use crate::application::rate_limiting::{get_client_identifier, RateLimiter};
use crate::domain::value_objects::LimitType;

/// Per-route rate limiting state: which policy applies and who counts it
#[derive(Clone)]
pub struct RateLimitLayerState {
    limiter: Arc<RateLimiter>,
    limit_type: LimitType,
    clock: Arc<dyn Clock>,
}

impl RateLimitLayerState {
    pub fn new(limiter: Arc<RateLimiter>, limit_type: LimitType, clock: Arc<dyn Clock>) -> Self {
        Self {
            limiter,
            limit_type,
            clock,
        }
    }
}

/// Rate limiting middleware.
///
/// Identifies the client from proxy headers, counts the request against the
/// route's limit type and either rejects with 429 or forwards the request,
/// adding the rate-limit headers to the response in both cases.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitLayerState>,
    request: Request,
    next: Next,
) -> Response {
    let identifier = get_client_identifier(request.headers());
    let result = state
        .limiter
        .check_limit(&identifier, state.limit_type)
        .await;

    if !result.success {
        return ApiError::too_many_requests(&result, state.clock.now()).into_response();
    }

    let mut response = next.run(request).await;
    response.headers_mut().extend(rate_limit_headers(&result));
    response
}
