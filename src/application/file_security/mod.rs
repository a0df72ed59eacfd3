//! Upload security checks
//!
//! [`FileUploadValidator`] is the entry point; the signature validator and
//! content scanner are usable on their own for callers with narrower needs.

pub mod content_scanner;
pub mod filename;
pub mod signature;
pub mod upload_validator;

pub use content_scanner::{ContentScan, ExecutableFormat, FileContentScanner, MAX_SCAN_SIZE};
pub use filename::sanitize_file_name;
pub use signature::{ConsistencyCheck, FileSignatureValidator};
pub use upload_validator::{
    has_executable_extension, FileUploadValidator, FileValidationConfig, EXECUTABLE_EXTENSIONS,
};
