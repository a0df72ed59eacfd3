use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::patterns::{until_stable, DANGEROUS_SCHEME, EVENT_HANDLER, TAG};
use crate::application::form_value::FormValue;
use crate::domain::value_objects::SanitizationResult;

/// Tags that are never allowed, with or without attributes
pub const DANGEROUS_TAGS: &[&str] = &[
    "script", "iframe", "object", "embed", "form", "input", "textarea", "select", "button",
    "link", "meta", "style", "base", "applet", "body", "html", "head", "title", "frame",
    "frameset", "noframes", "noscript", "xml", "import", "template",
];

/// Elements whose body is dropped together with the element itself
const CONTENT_DROPPING_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "applet", "noscript", "noframes", "frameset",
    "template", "xml", "title",
];

/// Formatting tags that survive, always rewritten without attributes
pub const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "strong", "em", "u", "i", "b", "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5", "h6",
];

static CONTENT_BLOCKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    CONTENT_DROPPING_TAGS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>"))
                .expect("Invalid content block regex")
        })
        .collect()
});

static DANGEROUS_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)<\s*/?\s*(?:{})\b[^>]*>",
        DANGEROUS_TAGS.join("|")
    ))
    .expect("Invalid dangerous tag regex")
});

static STYLE_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bstyle\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#)
        .expect("Invalid style attribute regex")
});

static COMMENT_OR_CDATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<!\[CDATA\[.*?\]\]>").expect("Invalid comment regex")
});

/// Every pattern in a pass needs at least one of these to match
const MARKUP_DELIMITERS: &[char] = &['<', '>', ':', '='];

/// Whitelist HTML cleaner for fields that may keep basic formatting
pub struct HtmlSanitizer;

impl HtmlSanitizer {
    /// Output contains no tag outside [`ALLOWED_TAGS`] and no attribute on any tag
    pub fn sanitize_html(input: &str) -> String {
        until_stable(input, MARKUP_DELIMITERS, Self::single_pass)
    }

    fn single_pass(input: &str) -> String {
        let mut html = input.to_string();
        for block in CONTENT_BLOCKS.iter() {
            html = block.replace_all(&html, "").into_owned();
        }

        let html = DANGEROUS_TAG.replace_all(&html, "");
        let html = DANGEROUS_SCHEME.replace_all(&html, "");
        let html = EVENT_HANDLER.replace_all(&html, "");
        let html = STYLE_ATTRIBUTE.replace_all(&html, "");
        // Malformed nesting can leave a script body behind once its outer tags are gone
        let html = CONTENT_BLOCKS[0].replace_all(&html, "");
        let html = COMMENT_OR_CDATA.replace_all(&html, "");
        TAG.replace_all(&html, |caps: &Captures| Self::canonical_tag(&caps[0]))
            .into_owned()
    }

    /// `<P class="x">` -> `<p>`, `</ul >` -> `</ul>`, anything not allowed -> ``
    fn canonical_tag(tag: &str) -> String {
        let inner = tag[1..tag.len() - 1].trim_start();
        let (closing, rest) = match inner.strip_prefix('/') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, inner),
        };
        let name: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        if ALLOWED_TAGS.contains(&name.as_str()) {
            format!("<{}{}>", if closing { "/" } else { "" }, name)
        } else {
            String::new()
        }
    }

    pub fn sanitize_html_value(value: &FormValue) -> SanitizationResult {
        match value {
            FormValue::Null => SanitizationResult::valid(String::new()),
            FormValue::String(s) => SanitizationResult::valid(Self::sanitize_html(s)),
            FormValue::Bool(b) => SanitizationResult::valid(b.to_string()),
            FormValue::Number(n) => SanitizationResult::valid(n.to_string()),
            other => SanitizationResult::invalid(format!(
                "Value of type {} cannot be converted to text",
                other.kind()
            )),
        }
    }
}
