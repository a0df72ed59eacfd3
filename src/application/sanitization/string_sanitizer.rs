use std::fmt::{Display, Write};

use super::patterns::{
    until_stable, DANGEROUS_SCHEME, EVENT_HANDLER, INVISIBLE_CHARS, MARKUP_ENTITY, SCRIPT_BLOCK,
    TAG,
};
use crate::application::form_value::FormValue;
use crate::domain::value_objects::SanitizationResult;

/// Every pattern in a pass needs at least one of these to match
const MARKUP_DELIMITERS: &[char] = &['<', '>', ':', '=', '&'];

/// Plain-text sanitizer: nothing that looks like markup survives
pub struct StringSanitizer;

impl StringSanitizer {
    /// Strip markup, dangerous schemes, event handlers, markup entities and
    /// invisible characters, then trim.
    ///
    /// The pipeline is re-applied until it no longer changes its output, so
    /// `sanitize(sanitize(s)) == sanitize(s)` even when a removal glues two
    /// harmless fragments into a dangerous one (`javajavascript:script:`).
    pub fn sanitize(input: &str) -> String {
        until_stable(input, MARKUP_DELIMITERS, Self::single_pass)
    }

    fn single_pass(input: &str) -> String {
        let text = SCRIPT_BLOCK.replace_all(input, "");
        let text = TAG.replace_all(&text, "");
        let text = DANGEROUS_SCHEME.replace_all(&text, "");
        let text = EVENT_HANDLER.replace_all(&text, "");
        let text = MARKUP_ENTITY.replace_all(&text, "");
        let text = INVISIBLE_CHARS.replace_all(&text, "");
        text.trim().to_string()
    }

    /// Sanitize a tree value as text. Null becomes the empty string, scalars
    /// are converted to text first, and containers or files cannot be.
    pub fn sanitize_value(value: &FormValue) -> SanitizationResult {
        match value {
            FormValue::Null => SanitizationResult::valid(String::new()),
            FormValue::String(s) => SanitizationResult::valid(Self::sanitize(s)),
            FormValue::Bool(b) => SanitizationResult::valid(b.to_string()),
            FormValue::Number(n) => SanitizationResult::valid(Self::sanitize(&n.to_string())),
            other => SanitizationResult::invalid(format!(
                "Value of type {} cannot be converted to text",
                other.kind()
            )),
        }
    }

    /// Sanitize anything printable. A formatter error counts as a failed
    /// conversion and yields an empty, invalid result instead of panicking.
    pub fn sanitize_display<T: Display + ?Sized>(value: Option<&T>) -> SanitizationResult {
        let Some(value) = value else {
            return SanitizationResult::valid(String::new());
        };

        let mut text = String::new();
        match write!(text, "{}", value) {
            Ok(()) => SanitizationResult::valid(Self::sanitize(&text)),
            Err(_) => SanitizationResult::invalid("Value could not be converted to text"),
        }
    }
}
