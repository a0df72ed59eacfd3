use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::application::ports::{FileReadError, FileSource};
use crate::domain::value_objects::FileTypeDescriptor;

/// Files above this size are left to the signature check alone
pub const MAX_SCAN_SIZE: u64 = 20 * 1024 * 1024;

/// Bytes decoded for the pattern scan
pub const SAMPLE_SIZE: usize = 4096;

/// Bytes inspected for embedded executable headers
pub const EXECUTABLE_PROBE_SIZE: usize = 64;

const PER_ERROR_PENALTY: i32 = 50;
const EXECUTABLE_PENALTY: i32 = 70;

/// Any inline handler attribute (`onload=`, `onmouseenter =`, ...), matched on case-folded text
static EVENT_HANDLER_ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bon[a-z]+\s*=").expect("Invalid event handler regex"));

/// Lowercase needles matched anywhere in the decoded sample
const SUSPICIOUS_PATTERNS: &[(&str, &str)] = &[
    ("<script", "script tag"),
    ("</script", "script tag"),
    ("javascript:", "javascript URI"),
    ("vbscript:", "vbscript URI"),
    ("data:text/html", "HTML data URI"),
    ("data:text/javascript", "JavaScript data URI"),
    ("data:text/vbscript", "VBScript data URI"),
    ("data:application/", "application data URI"),
    ("eval(", "eval call"),
    ("document.write", "document.write call"),
    ("innerhtml", "innerHTML access"),
    ("outerhtml", "outerHTML access"),
    ("<foreignobject", "SVG foreignObject"),
    ("<use", "SVG use element"),
    ("xlink:href=\"javascript:", "SVG javascript link"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutableFormat {
    WindowsPe,
    Elf,
}

impl ExecutableFormat {
    /// Recognize an executable header at offset 0
    pub fn detect(header: &[u8]) -> Option<Self> {
        if header.starts_with(b"MZ") {
            Some(ExecutableFormat::WindowsPe)
        } else if header.starts_with(&[0x7F, b'E', b'L', b'F']) {
            Some(ExecutableFormat::Elf)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExecutableFormat::WindowsPe => "Windows PE",
            ExecutableFormat::Elf => "ELF",
        }
    }
}

/// Findings of one content scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentScan {
    pub errors: Vec<String>,
    /// Non-positive adjustment to the security score
    pub security_score_delta: i32,
    pub executable: Option<ExecutableFormat>,
}

impl ContentScan {
    fn record(&mut self, error: String) {
        self.errors.push(error);
        self.security_score_delta -= PER_ERROR_PENALTY;
    }
}

/// Looks inside a bounded prefix of a file for active content
pub struct FileContentScanner;

impl FileContentScanner {
    /// Scan the leading bytes of `file`.
    ///
    /// The executable header probe always runs. The pattern scan only runs
    /// when the registry entry asks for it. Files larger than
    /// [`MAX_SCAN_SIZE`] are not read at all.
    pub async fn scan(
        file: &dyn FileSource,
        descriptor: Option<&FileTypeDescriptor>,
    ) -> Result<ContentScan, FileReadError> {
        let mut scan = ContentScan::default();
        if file.size() > MAX_SCAN_SIZE {
            return Ok(scan);
        }

        let scan_patterns = descriptor.is_some_and(|d| d.scan_content);
        let read_len = if scan_patterns {
            SAMPLE_SIZE
        } else {
            EXECUTABLE_PROBE_SIZE
        };
        let sample = file.read_bytes(0, read_len).await?;

        let probe = &sample[..sample.len().min(EXECUTABLE_PROBE_SIZE)];
        if let Some(format) = ExecutableFormat::detect(probe) {
            warn!(
                format = format.name(),
                mime_type = file.mime_type(),
                size = file.size(),
                "Executable header found in upload"
            );
            scan.record(format!(
                "File contains an embedded executable ({})",
                format.name()
            ));
            scan.security_score_delta -= EXECUTABLE_PENALTY;
            scan.executable = Some(format);
        }

        if scan_patterns {
            if let Some(label) = Self::find_suspicious_pattern(&sample) {
                warn!(
                    pattern = label,
                    mime_type = file.mime_type(),
                    "Suspicious content found in upload"
                );
                scan.record(format!("File contains potentially dangerous content ({})", label));
            }
        }

        Ok(scan)
    }

    /// First suspicious pattern in a byte sample, decoded leniently and case-folded
    pub fn find_suspicious_pattern(sample: &[u8]) -> Option<&'static str> {
        let text = String::from_utf8_lossy(sample).to_lowercase();
        SUSPICIOUS_PATTERNS
            .iter()
            .find(|(needle, _)| text.contains(needle))
            .map(|(_, label)| *label)
            .or_else(|| EVENT_HANDLER_ATTRIBUTE.is_match(&text).then_some("event handler"))
    }
}
