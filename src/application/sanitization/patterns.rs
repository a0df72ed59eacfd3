//! Compiled patterns shared by the string and HTML sanitizers

use once_cell::sync::Lazy;
use regex::Regex;

/// URI schemes that can execute code or load local/privileged resources
pub(crate) const DANGEROUS_SCHEMES: &[&str] = &[
    "javascript",
    "data",
    "vbscript",
    "file",
    "about",
    "chrome",
    "chrome-extension",
    "moz-extension",
    "ms-browser-extension",
    "safari-extension",
    "livescript",
    "mocha",
];

/// Any `<...>` sequence, no whitelist
pub(crate) static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"));

/// Script and style elements including their bodies
pub(crate) static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("Invalid script block regex")
});

/// Scheme name followed by a colon, tolerating whitespace before the colon
pub(crate) static DANGEROUS_SCHEME: Lazy<Regex> = Lazy::new(|| {
    let alternation = DANGEROUS_SCHEMES
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)(?:{})\s*:", alternation)).expect("Invalid scheme regex")
});

/// Inline event handler attribute such as `onclick =`
pub(crate) static EVENT_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)on\w+\s*=").expect("Invalid event handler regex"));

/// Entities that decode back into markup delimiters
pub(crate) static MARKUP_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)&(?:lt|gt|quot|#x27|#x2f|#x5c|#96);").expect("Invalid entity regex")
});

pub(crate) static INVISIBLE_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x{200B}-\x{200D}\x{FEFF}]").expect("Invalid invisible char regex")
});

/// Passes tried before falling back to delimiter stripping
pub(crate) const MAX_PASSES: usize = 8;

/// Apply `pass` repeatedly until the output is stable.
///
/// Input that is still changing after [`MAX_PASSES`] passes (deeply nested
/// fragments such as `javajavascript:script:`) loses every char in
/// `delimiters` and gets one last pass. No pattern can match without those
/// chars, so that result is a fixpoint too.
pub(crate) fn until_stable(
    input: &str,
    delimiters: &[char],
    pass: impl Fn(&str) -> String,
) -> String {
    let mut current = pass(input);
    for _ in 1..MAX_PASSES {
        let next = pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }

    tracing::debug!(
        len = current.len(),
        "Sanitizer output not stable, stripping delimiters"
    );
    let stripped: String = current.chars().filter(|c| !delimiters.contains(c)).collect();
    pass(&stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_scheme_pattern_tolerates_case_and_spacing() {
        for input in [
            "javascript:",
            "JavaScript :",
            "vbscript\t:",
            "DATA:",
            "chrome-extension:",
            "moz-extension:",
            "livescript:",
        ] {
            assert!(DANGEROUS_SCHEME.is_match(input), "{input}");
        }
        assert!(!DANGEROUS_SCHEME.is_match("https://example.com"));
    }

    #[test]
    fn test_event_handler_pattern() {
        assert!(EVENT_HANDLER.is_match("onclick="));
        assert!(EVENT_HANDLER.is_match("ONMOUSEOVER ="));
        assert!(!EVENT_HANDLER.is_match("on ="));
    }

    fn strip_one_a(s: &str) -> String {
        s.strip_prefix('a').unwrap_or(s).to_string()
    }

    #[test]
    fn test_until_stable_stops_at_fixpoint() {
        let calls = Cell::new(0);
        let out = until_stable("aaaa", &['a'], |s| {
            calls.set(calls.get() + 1);
            strip_one_a(s)
        });
        assert_eq!(out, "");
        assert_eq!(calls.get(), 5);
    }

    #[test]
    fn test_until_stable_caps_passes_and_strips_delimiters() {
        let input = "a".repeat(10_000) + "b";
        let calls = Cell::new(0);
        let out = until_stable(&input, &['a'], |s| {
            calls.set(calls.get() + 1);
            strip_one_a(s)
        });
        assert_eq!(out, "b");
        assert_eq!(calls.get(), MAX_PASSES + 1);
    }
}
