use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::layer::util::Stack;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::api::handlers::{health_handler, validate_file_handler, validate_form_handler};
use crate::api::middleware::{rate_limit_middleware, RateLimitLayerState};
use crate::application::{
    file_security::{FileUploadValidator, FileValidationConfig},
    ports::Clock,
    rate_limiting::RateLimiter,
    sanitization::FormDataValidator,
};
use crate::domain::value_objects::LimitType;

/// Application state container
#[derive(Clone)]
pub struct AppState {
    pub rate_limiter: Arc<RateLimiter>,
    pub form_validator: Arc<FormDataValidator>,
    pub upload_validator: Arc<FileUploadValidator>,
    pub file_config: Arc<FileValidationConfig>,
    pub clock: Arc<dyn Clock>,
    pub max_body_size: usize,
}

impl AppState {
    fn rate_limit_layer(&self, limit_type: LimitType) -> RateLimitLayerState {
        RateLimitLayerState::new(
            Arc::clone(&self.rate_limiter),
            limit_type,
            Arc::clone(&self.clock),
        )
    }
}

/// Replace axum's 2MB default with the configured bound.
///
/// Applied per route so that it sits inside the rate limit and oversized
/// requests still spend budget.
fn body_limit(max_body_size: usize) -> Stack<RequestBodyLimitLayer, DefaultBodyLimit> {
    Stack::new(
        RequestBodyLimitLayer::new(max_body_size),
        DefaultBodyLimit::disable(),
    )
}

/// Create router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.max_body_size;

    let forms = Router::new()
        .route(
            "/v1/forms/validate",
            post(validate_form_handler).layer(body_limit(max_body_size)),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.rate_limit_layer(LimitType::FormSubmission),
            rate_limit_middleware,
        ));

    let files = Router::new()
        .route(
            "/v1/files/validate",
            post(validate_file_handler).layer(body_limit(max_body_size)),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.rate_limit_layer(LimitType::FileUpload),
            rate_limit_middleware,
        ));

    Router::new()
        // Health check (not rate limited)
        .route("/health", get(health_handler))
        .merge(forms)
        .merge(files)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
