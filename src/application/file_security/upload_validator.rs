use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::content_scanner::FileContentScanner;
use super::filename::sanitize_file_name;
use super::signature::FileSignatureValidator;
use crate::application::ports::{Clock, FileSource};
use crate::domain::value_objects::{descriptor_for, is_legacy_allowed_type, FileValidationResult};

const LARGE_FILE_WARNING_SIZE: u64 = 100 * 1024 * 1024;

/// Extensions rejected unless executables are explicitly allowed
pub const EXECUTABLE_EXTENSIONS: &[&str] = &[
    ".exe", ".bat", ".cmd", ".com", ".pif", ".scr", ".vbs", ".js", ".jar", ".php", ".asp", ".aspx",
    ".jsp", ".py", ".rb", ".pl", ".sh", ".ps1",
];

pub const READ_FAILURE: &str = "Unable to read file contents";

mod penalty {
    pub const OVER_MAX_SIZE: i32 = 30;
    pub const EMPTY: i32 = 50;
    pub const LARGE_FILE: i32 = 10;
    pub const INCONSISTENT_TYPE: i32 = 60;
    pub const LEGACY_TYPE: i32 = 5;
    pub const EXECUTABLE_EXTENSION: i32 = 60;
    pub const PER_ERROR: i32 = 5;
    pub const PER_WARNING: i32 = 2;
}

/// Caller policy for one upload endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileValidationConfig {
    /// Global size limit in bytes, independent of the per-type limit
    pub max_size: u64,
    pub allow_executables: bool,
}

impl Default for FileValidationConfig {
    fn default() -> Self {
        Self {
            max_size: 10 * 1024 * 1024,
            allow_executables: false,
        }
    }
}

impl FileValidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_allow_executables(mut self, allow: bool) -> Self {
        self.allow_executables = allow;
        self
    }
}

/// Running verdict; the score only ever goes down
struct Assessment {
    errors: Vec<String>,
    warnings: Vec<String>,
    score: i32,
}

impl Assessment {
    fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            score: 100,
        }
    }

    fn error(&mut self, message: impl Into<String>, penalty: i32) {
        self.errors.push(message.into());
        self.score -= penalty;
    }

    fn warning(&mut self, message: impl Into<String>, penalty: i32) {
        self.warnings.push(message.into());
        self.score -= penalty;
    }

    fn has_error(&self, message: &str) -> bool {
        self.errors.iter().any(|e| e == message)
    }

    fn finish(mut self, sanitized_name: String) -> FileValidationResult {
        if self.errors.len() > 1 {
            self.score -= penalty::PER_ERROR * self.errors.len() as i32;
        }
        if self.warnings.len() > 2 {
            self.score -= penalty::PER_WARNING * self.warnings.len() as i32;
        }
        let score = self.score.clamp(0, 100) as u8;
        FileValidationResult::new(self.errors, self.warnings, Some(sanitized_name), score)
    }
}

/// Turns all file checks into one scored verdict
#[derive(Clone)]
pub struct FileUploadValidator {
    clock: Arc<dyn Clock>,
}

impl FileUploadValidator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Validate an upload. Never fails: read errors become validation errors.
    pub async fn validate_file(
        &self,
        file: &dyn FileSource,
        config: &FileValidationConfig,
    ) -> FileValidationResult {
        let mut assessment = Assessment::new();
        let size = file.size();

        if size > config.max_size {
            assessment.error(
                format!("File exceeds maximum size of {} bytes", config.max_size),
                penalty::OVER_MAX_SIZE,
            );
        }
        if size == 0 {
            assessment.error("File is empty", penalty::EMPTY);
        }
        if size > LARGE_FILE_WARNING_SIZE {
            assessment.warning("File is unusually large", penalty::LARGE_FILE);
        }

        let sanitized_name = sanitize_file_name(file.name(), self.clock.now());

        match FileSignatureValidator::check_consistency(file).await {
            Ok(check) if check.is_valid => {
                if !is_legacy_allowed_type(file.mime_type()) {
                    assessment.warning(
                        format!(
                            "File type {} is not accepted by older clients",
                            file.mime_type()
                        ),
                        penalty::LEGACY_TYPE,
                    );
                }
            }
            Ok(check) => {
                for error in check.errors {
                    assessment.error(error, 0);
                }
                assessment.score -= penalty::INCONSISTENT_TYPE;
            }
            Err(e) => {
                warn!(error = %e, mime_type = file.mime_type(), "Failed to read upload header");
                assessment.error(READ_FAILURE, penalty::INCONSISTENT_TYPE);
            }
        }

        match FileContentScanner::scan(file, descriptor_for(file.mime_type())).await {
            Ok(scan) => {
                assessment.errors.extend(scan.errors);
                assessment.score += scan.security_score_delta;
            }
            Err(e) => {
                warn!(error = %e, mime_type = file.mime_type(), "Failed to read upload sample");
                if !assessment.has_error(READ_FAILURE) {
                    assessment.error(READ_FAILURE, penalty::INCONSISTENT_TYPE);
                }
            }
        }

        if !config.allow_executables && has_executable_extension(file.name()) {
            assessment.error(
                "Executable file types are not allowed",
                penalty::EXECUTABLE_EXTENSION,
            );
        }

        let result = assessment.finish(sanitized_name);
        debug!(
            mime_type = file.mime_type(),
            size,
            is_valid = result.is_valid,
            score = result.security_score,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "File validated"
        );
        result
    }
}

pub fn has_executable_extension(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    EXECUTABLE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{FileReadError, MockFileSource};
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::files::InMemoryFile;
    use chrono::{TimeZone, Utc};

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    fn validator() -> FileUploadValidator {
        let clock = ManualClock::new(Utc.timestamp_millis_opt(1_000).unwrap());
        FileUploadValidator::new(Arc::new(clock))
    }

    #[tokio::test]
    async fn test_clean_png_scores_full() {
        let file = InMemoryFile::new("cat.png", "image/png", PNG.to_vec());
        let result = validator().validate_file(&file, &FileValidationConfig::default()).await;
        assert!(result.is_valid);
        assert_eq!(result.security_score, 100);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(result.sanitized_name.as_deref(), Some("cat_1000.png"));
    }

    #[tokio::test]
    async fn test_spoofed_png_fails() {
        let file = InMemoryFile::new("evil.png", "image/png", b"<svg onload=alert(1)>".to_vec());
        let result = validator().validate_file(&file, &FileValidationConfig::default()).await;
        assert!(!result.is_valid);
        assert!(result.security_score <= 40);
        assert!(result.errors.iter().any(|e| e.contains("possible spoofing")));
    }

    #[tokio::test]
    async fn test_avif_is_valid_with_legacy_warning() {
        let mut bytes = vec![0, 0, 0, 0x1C];
        bytes.extend_from_slice(b"ftypavif");
        bytes.resize(64, 0);
        let file = InMemoryFile::new("pic.avif", "image/avif", bytes);
        let result = validator().validate_file(&file, &FileValidationConfig::default()).await;
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.security_score, 95);
    }

    #[tokio::test]
    async fn test_empty_file() {
        let file = InMemoryFile::new("empty.png", "image/png", Vec::<u8>::new());
        let result = validator().validate_file(&file, &FileValidationConfig::default()).await;
        assert!(!result.is_valid);
        assert!(result.errors.contains(&"File is empty".to_string()));
        // -50 empty, -60 signature, -5 * 2 errors
        assert_eq!(result.security_score, 0);
    }

    #[tokio::test]
    async fn test_global_size_limit() {
        let mut bytes = PNG.to_vec();
        bytes.resize(2048, 0);
        let file = InMemoryFile::new("cat.png", "image/png", bytes);
        let config = FileValidationConfig::new().with_max_size(1024);
        let result = validator().validate_file(&file, &config).await;
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.security_score, 70);
    }

    #[tokio::test]
    async fn test_executable_smuggled_as_jpeg() {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.resize(128, 0);
        let mut exe = b"MZ".to_vec();
        exe.resize(128, 0);
        let file = InMemoryFile::new("photo.jpg", "image/jpeg", exe);
        let result = validator().validate_file(&file, &FileValidationConfig::default()).await;
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("executable")));

        let clean = InMemoryFile::new("photo.jpg", "image/jpeg", bytes);
        let result = validator().validate_file(&clean, &FileValidationConfig::default()).await;
        assert!(result.is_valid);
    }

    #[tokio::test]
    async fn test_executable_extension_policy() {
        let file = InMemoryFile::new("run.sh", "application/x-sh", b"#!/bin/sh".to_vec());
        let denied = validator().validate_file(&file, &FileValidationConfig::default()).await;
        assert!(denied
            .errors
            .contains(&"Executable file types are not allowed".to_string()));

        let config = FileValidationConfig::new().with_allow_executables(true);
        let allowed = validator().validate_file(&file, &config).await;
        assert!(!allowed
            .errors
            .contains(&"Executable file types are not allowed".to_string()));
        // Still an unregistered MIME type
        assert!(!allowed.is_valid);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_reported_once() {
        let mut file = MockFileSource::new();
        file.expect_name().return_const("a.png".to_string());
        file.expect_mime_type().return_const("image/png".to_string());
        file.expect_size().return_const(100u64);
        file.expect_read_bytes()
            .returning(|_, _| Err(FileReadError::Internal("disk gone".to_string())));

        let result = validator().validate_file(&file, &FileValidationConfig::default()).await;
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec![READ_FAILURE.to_string()]);
        assert_eq!(result.security_score, 40);
    }

    #[tokio::test]
    async fn test_type_limit_applies_when_global_limit_is_lifted() {
        let mut file = MockFileSource::new();
        file.expect_name().return_const("huge.avif".to_string());
        file.expect_mime_type().return_const("image/avif".to_string());
        file.expect_size().return_const(200 * 1024 * 1024u64);
        file.expect_read_bytes().returning(|_, _| {
            let mut header = vec![0, 0, 0, 0x1C];
            header.extend_from_slice(b"ftypavif");
            Ok(bytes::Bytes::from(header))
        });

        // Over the AVIF limit and the warning threshold, not the global limit
        let config = FileValidationConfig::new().with_max_size(u64::MAX);
        let result = validator().validate_file(&file, &config).await;
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("image/avif"));
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.security_score, 30);
    }

    #[test]
    fn test_score_finalization_penalties() {
        let mut assessment = Assessment::new();
        assessment.warning("a", 0);
        assessment.warning("b", 0);
        assessment.warning("c", 0);
        let result = assessment.finish("x".into());
        assert_eq!(result.security_score, 94);
        assert!(result.is_valid);

        let mut assessment = Assessment::new();
        assessment.error("a", 10);
        assessment.error("b", 10);
        let result = assessment.finish("x".into());
        assert_eq!(result.security_score, 70);
        assert!(!result.is_valid);

        let mut assessment = Assessment::new();
        assessment.error("a", 500);
        assert_eq!(assessment.finish("x".into()).security_score, 0);
    }

    #[test]
    fn test_zero_errors_low_score_is_invalid() {
        let mut assessment = Assessment::new();
        for w in ["a", "b", "c", "d", "e"] {
            assessment.warning(w, 9);
        }
        let result = assessment.finish("x".into());
        assert!(result.errors.is_empty());
        assert_eq!(result.security_score, 45);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_executable_extensions() {
        assert!(has_executable_extension("setup.EXE"));
        assert!(has_executable_extension("script.ps1"));
        assert!(!has_executable_extension("notes.json"));
        assert!(!has_executable_extension("photo.png"));
    }
}
