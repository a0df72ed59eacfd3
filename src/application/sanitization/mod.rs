//! Input sanitization for untrusted form submissions
//!
//! Two text sanitizers (plain text and whitelisted HTML) and a recursive
//! validator that routes every string in a submission tree to one of them
//! based on the field name.

pub mod config;
pub mod form_validator;
pub mod html_sanitizer;
pub mod patterns;
pub mod string_sanitizer;

#[cfg(test)]
mod tests;

pub use config::SanitizationConfig;
pub use form_validator::{FieldOutcome, FormDataValidator, FormValidationResult};
pub use html_sanitizer::{HtmlSanitizer, ALLOWED_TAGS, DANGEROUS_TAGS};
pub use string_sanitizer::StringSanitizer;

use crate::application::form_value::FormValue;

/// Convenience entry points using the default configuration.
/// Strip every trace of markup from a plain-text value
pub fn sanitize_string(input: &str) -> String {
    StringSanitizer::sanitize(input)
}

/// Keep only whitelisted formatting tags, without attributes
pub fn sanitize_html(input: &str) -> String {
    HtmlSanitizer::sanitize_html(input)
}

/// Whether a field with this name may keep whitelisted HTML
pub fn is_html_allowed_field(field_name: &str) -> bool {
    SanitizationConfig::default().is_html_allowed_field(field_name)
}

/// Sanitize a whole submission with default limits
pub fn validate_form_data(data: &FormValue) -> FormValidationResult {
    FormDataValidator::default().validate_form_data(data)
}
