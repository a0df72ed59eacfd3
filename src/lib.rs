//! # Submission Guard - Input Security & Rate Limiting
//!
//! Screens untrusted submissions before they reach application code,
//! built on Clean Architecture principles.
//!
//! ## Architecture Layers
//!
//! - **Domain**: Verdicts, file-type registry, rate-limit policies and records
//! - **Application**: Sanitizers, form and upload validators, rate limiter, ports
//! - **Infrastructure**: Clocks, file sources and rate-limit backends
//! - **API**: HTTP handlers and the per-route rate-limit middleware
//!
//! ## Key Features
//!
//! - Idempotent string and HTML sanitization
//! - Recursive form validation with depth and cycle guards
//! - Magic-byte file signature checks and content scanning with a security score
//! - Per-client fixed-window rate limiting with progressive penalties
//! - Fail-open fallback from a distributed limiter to in-memory counting
//!
//! ## Example Usage
//!
//! ```no_run
//! use submission_guard::{ApplicationBuilder, Config, LimitType};
//!
//! # async fn example() -> Result<(), String> {
//! let app = ApplicationBuilder::new(Config::default()).build()?;
//! let verdict = app
//!     .state
//!     .rate_limiter
//!     .check_limit("ip_203.0.113.7", LimitType::FormSubmission)
//!     .await;
//! assert!(verdict.success);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export key types explicitly to avoid ambiguity
pub use api::errors as api_errors;
pub use application::builder::{Application, ApplicationBuilder};
pub use application::file_security::{FileUploadValidator, FileValidationConfig};
pub use application::form_value::FormValue;
pub use application::rate_limiting::{get_client_identifier, RateLimiter};
pub use application::sanitization::{
    is_html_allowed_field, sanitize_html, sanitize_string, validate_form_data, FormDataValidator,
    FormValidationResult, SanitizationConfig,
};
pub use application::ports;
pub use config::Config;
pub use domain::errors as domain_errors;
pub use domain::value_objects::{
    Environment, FileValidationResult, LimitType, RateLimitResult, SanitizationResult,
};
pub use domain::{entities, value_objects};
