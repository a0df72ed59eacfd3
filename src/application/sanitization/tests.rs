//! Cross-module tests for the sanitization pipeline

mod routing_tests {
    use super::super::{is_html_allowed_field, validate_form_data};
    use crate::application::form_value::FormValue;
    use serde_json::json;

    #[test]
    fn test_html_field_markers() {
        assert!(is_html_allowed_field("content"));
        assert!(is_html_allowed_field("pageContent"));
        assert!(is_html_allowed_field("DESCRIPTION"));
        assert!(is_html_allowed_field("heroHeadline"));
        assert!(is_html_allowed_field("sectioncontent_2"));
        assert!(!is_html_allowed_field("title"));
        assert!(!is_html_allowed_field("desc"));
        assert!(!is_html_allowed_field(""));
    }

    #[test]
    fn test_mixed_submission() {
        let data = FormValue::from(json!({
            "name": "<b>Bold</b>",
            "content": "<p>ok</p><script>x</script>",
            "seoDescription": "<p onclick=\"x()\">Meta</p>",
            "email": "  user@example.com\u{200B} "
        }));

        let result = validate_form_data(&data);
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert_eq!(
            result.sanitized.to_json(),
            json!({
                "name": "Bold",
                "content": "<p>ok</p>",
                "seoDescription": "<p>Meta</p>",
                "email": "user@example.com"
            })
        );
    }

    #[test]
    fn test_missing_submission() {
        let result = validate_form_data(&FormValue::Null);
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["Form data is required".to_string()]);
        assert_eq!(result.sanitized.to_json(), json!({}));
    }

    #[test]
    fn test_top_level_array_rejected() {
        let result = validate_form_data(&FormValue::from(json!(["a", "b"])));
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["Form data must be an object".to_string()]);
    }
}

mod consistency_tests {
    use super::super::{HtmlSanitizer, StringSanitizer, ALLOWED_TAGS};
    use once_cell::sync::Lazy;
    use regex::Regex;

    static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(/?)([^\s>/]*)([^>]*)>").unwrap());

    const HOSTILE: &[&str] = &[
        r#"<img src=x onerror=alert(1)>"#,
        r#"<svg/onload=alert(1)>"#,
        r#"<a href="javascript:alert(1)">x</a>"#,
        r#"<div style="background:url(javascript:x)">y</div>"#,
        "<scr<script>ipt>alert(1)</scr</script>ipt>",
        "<<p>p onclick=x>text</p>",
        "&lt;script&gt;alert(1)&lt;/script&gt;",
        "<iframe src=//evil></iframe><p>after</p>",
        "<P CLASS=x>Upper</P><BR/>",
        "<!--[if IE]><script>x</script><![endif]-->",
    ];

    #[test]
    fn test_plain_text_has_no_markup() {
        for input in HOSTILE {
            let out = StringSanitizer::sanitize(input);
            assert!(!out.contains('<') || !out.contains('>'), "{input} -> {out}");
            assert!(!out.to_lowercase().contains("javascript:"), "{input} -> {out}");
            assert!(!out.to_lowercase().contains("onerror="), "{input} -> {out}");
        }
    }

    #[test]
    fn test_html_output_only_has_bare_allowed_tags() {
        for input in HOSTILE {
            let out = HtmlSanitizer::sanitize_html(input);
            for caps in ANY_TAG.captures_iter(&out) {
                let name = caps[2].to_string();
                assert!(ALLOWED_TAGS.contains(&name.as_str()), "{input} -> {out}");
                assert!(caps[3].is_empty(), "attributes survived: {input} -> {out}");
            }
        }
    }

    #[test]
    fn test_both_sanitizers_are_idempotent() {
        for input in HOSTILE {
            let text = StringSanitizer::sanitize(input);
            assert_eq!(StringSanitizer::sanitize(&text), text);
            let html = HtmlSanitizer::sanitize_html(input);
            assert_eq!(HtmlSanitizer::sanitize_html(&html), html);
        }
    }
}
