use std::collections::HashSet;
use tracing::{debug, warn};

use super::config::SanitizationConfig;
use super::html_sanitizer::HtmlSanitizer;
use super::string_sanitizer::StringSanitizer;
use crate::application::form_value::{FormObject, FormValue};

/// Outcome of sanitizing a whole submission tree
#[derive(Debug, Clone)]
pub struct FormValidationResult {
    pub is_valid: bool,
    /// Same shape as the input; files are the same handles
    pub sanitized: FormValue,
    pub errors: Vec<String>,
}

impl FormValidationResult {
    fn from_parts(sanitized: FormValue, errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            sanitized,
            errors,
        }
    }

    fn rejected(error: impl Into<String>) -> Self {
        Self::from_parts(FormValue::Object(FormObject::new()), vec![error.into()])
    }
}

/// Result of sanitizing one field: the value to store plus an optional error.
/// The value is always present, as a best-effort fallback when the field failed.
#[derive(Debug, Clone)]
pub struct FieldOutcome {
    pub sanitized: FormValue,
    pub error: Option<String>,
}

/// Failures that abort the whole walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StructuralError {
    Circular,
    TooDeep(usize),
}

impl StructuralError {
    fn message(&self) -> String {
        match self {
            StructuralError::Circular => "Form data contains a circular reference".to_string(),
            StructuralError::TooDeep(max) => {
                format!("Form data exceeds maximum nesting depth of {}", max)
            }
        }
    }
}

/// Recursive sanitizer for untrusted submission trees
#[derive(Debug, Clone, Default)]
pub struct FormDataValidator {
    config: SanitizationConfig,
}

impl FormDataValidator {
    pub fn new(config: SanitizationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SanitizationConfig {
        &self.config
    }

    /// Sanitize every field of a submission object.
    ///
    /// Field errors are collected as `"<key>: <message>"` without stopping the
    /// walk. A cycle or excessive nesting rejects the whole submission with
    /// an empty sanitized object.
    pub fn validate_form_data(&self, data: &FormValue) -> FormValidationResult {
        let object = match data {
            FormValue::Null => return FormValidationResult::rejected("Form data is required"),
            FormValue::Object(object) => object,
            other => {
                debug!(kind = other.kind(), "Rejected non-object form data");
                return FormValidationResult::rejected("Form data must be an object");
            }
        };

        let mut walk = Walk::new(&self.config);
        match walk.object(object, 1) {
            Ok((sanitized, errors)) => {
                FormValidationResult::from_parts(FormValue::Object(sanitized), errors)
            }
            Err(structural) => {
                warn!(error = ?structural, "Rejected structurally invalid form data");
                FormValidationResult::rejected(structural.message())
            }
        }
    }

    /// Sanitize a single named field the same way the full walk would
    pub fn validate_and_sanitize_field(&self, key: &str, value: &FormValue) -> FieldOutcome {
        let mut walk = Walk::new(&self.config);
        match walk.field(key, value, 1) {
            Ok(outcome) => outcome,
            Err(structural) => FieldOutcome {
                sanitized: FormValue::Null,
                error: Some(structural.message()),
            },
        }
    }
}

/// Traversal state: configuration plus identities of the objects on the current path
struct Walk<'a> {
    config: &'a SanitizationConfig,
    ancestors: HashSet<usize>,
}

impl<'a> Walk<'a> {
    fn new(config: &'a SanitizationConfig) -> Self {
        Self {
            config,
            ancestors: HashSet::new(),
        }
    }

    fn check_depth(&self, depth: usize) -> Result<(), StructuralError> {
        if depth > self.config.max_depth {
            return Err(StructuralError::TooDeep(self.config.max_depth));
        }
        Ok(())
    }

    fn object(
        &mut self,
        object: &FormObject,
        depth: usize,
    ) -> Result<(FormObject, Vec<String>), StructuralError> {
        self.check_depth(depth)?;
        if !self.ancestors.insert(object.id()) {
            return Err(StructuralError::Circular);
        }

        let sanitized = FormObject::new();
        let mut errors = Vec::new();
        for (key, value) in object.entries() {
            let outcome = self.field(&key, &value, depth)?;
            if let Some(error) = outcome.error {
                errors.push(format!("{}: {}", key, error));
            }
            sanitized.insert(key, outcome.sanitized);
        }

        self.ancestors.remove(&object.id());
        Ok((sanitized, errors))
    }

    fn field(
        &mut self,
        key: &str,
        value: &FormValue,
        depth: usize,
    ) -> Result<FieldOutcome, StructuralError> {
        let outcome = match value {
            FormValue::Array(items) => {
                let (sanitized, errors) = self.array(items, depth + 1)?;
                FieldOutcome {
                    sanitized: FormValue::Array(sanitized),
                    error: join_errors(errors),
                }
            }
            FormValue::Object(object) => {
                let (sanitized, errors) = self.object(object, depth + 1)?;
                FieldOutcome {
                    sanitized: FormValue::Object(sanitized),
                    error: join_errors(errors),
                }
            }
            FormValue::String(text) => {
                if self.config.is_html_allowed_field(key) {
                    debug!(field = key, "Sanitizing field as HTML");
                    self.string(text, HtmlSanitizer::sanitize_html)
                } else {
                    self.string(text, StringSanitizer::sanitize)
                }
            }
            FormValue::File(_) | FormValue::Null | FormValue::Bool(_) | FormValue::Number(_) => {
                FieldOutcome {
                    sanitized: value.clone(),
                    error: None,
                }
            }
        };
        Ok(outcome)
    }

    /// Array elements are sanitized as plain text regardless of the field name
    fn array(
        &mut self,
        items: &[FormValue],
        depth: usize,
    ) -> Result<(Vec<FormValue>, Vec<String>), StructuralError> {
        self.check_depth(depth)?;

        let mut sanitized = Vec::with_capacity(items.len());
        let mut errors = Vec::new();
        for item in items {
            let value = match item {
                FormValue::String(text) => {
                    let outcome = self.string(text, StringSanitizer::sanitize);
                    errors.extend(outcome.error);
                    outcome.sanitized
                }
                FormValue::Object(object) => {
                    let (nested, nested_errors) = self.object(object, depth + 1)?;
                    errors.extend(nested_errors);
                    FormValue::Object(nested)
                }
                FormValue::Array(inner) => {
                    let (nested, nested_errors) = self.array(inner, depth + 1)?;
                    errors.extend(nested_errors);
                    FormValue::Array(nested)
                }
                FormValue::File(_) | FormValue::Null | FormValue::Bool(_) | FormValue::Number(_) => {
                    item.clone()
                }
            };
            sanitized.push(value);
        }
        Ok((sanitized, errors))
    }

    /// Over-long strings are cut to the limit before sanitizing and reported
    fn string(&self, text: &str, sanitize: fn(&str) -> String) -> FieldOutcome {
        let max = self.config.max_string_length;
        if text.chars().count() > max {
            let truncated: String = text.chars().take(max).collect();
            return FieldOutcome {
                sanitized: FormValue::String(sanitize(&truncated)),
                error: Some(format!("exceeds maximum length of {} characters", max)),
            };
        }
        FieldOutcome {
            sanitized: FormValue::String(sanitize(text)),
            error: None,
        }
    }
}

fn join_errors(errors: Vec<String>) -> Option<String> {
    if errors.is_empty() {
        None
    } else {
        Some(errors.join(", "))
    }
}
