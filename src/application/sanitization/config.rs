use serde::{Deserialize, Serialize};

/// Form sanitization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizationConfig {
    /// Maximum length of a single string field, in characters
    pub max_string_length: usize,
    /// Maximum nesting of objects and arrays
    pub max_depth: usize,
    /// Case-insensitive field-name markers that route a string to the HTML sanitizer
    pub html_field_markers: Vec<String>,
}

impl Default for SanitizationConfig {
    fn default() -> Self {
        Self {
            max_string_length: 50_000,
            max_depth: 10,
            html_field_markers: ["content", "description", "headline", "sectionContent"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl SanitizationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum string length
    pub fn with_max_string_length(mut self, length: usize) -> Self {
        self.max_string_length = length;
        self
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Add a field-name marker for HTML-capable fields
    pub fn with_html_field_marker(mut self, marker: impl Into<String>) -> Self {
        self.html_field_markers.push(marker.into());
        self
    }

    /// Whether a field may keep whitelisted HTML, judged by its name alone
    pub fn is_html_allowed_field(&self, field_name: &str) -> bool {
        let name = field_name.to_lowercase();
        self.html_field_markers
            .iter()
            .any(|marker| name.contains(&marker.to_lowercase()))
    }
}
