use tracing::warn;

use crate::application::ports::{FileReadError, FileSource};
use crate::domain::value_objects::descriptor_for;

/// Outcome of the type consistency check; at most one error is ever reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyCheck {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ConsistencyCheck {
    fn passed() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            errors: vec![error.into()],
        }
    }
}

/// Cross-checks declared MIME type, file name, leading bytes and size
pub struct FileSignatureValidator;

impl FileSignatureValidator {
    /// Check, in order, that the MIME type is registered, the extension
    /// matches it, the leading bytes match its signature and the size is
    /// within its limit. The first failing check ends the call.
    ///
    /// Only the header bytes the signature needs are read.
    pub async fn check_consistency(file: &dyn FileSource) -> Result<ConsistencyCheck, FileReadError> {
        let mime_type = file.mime_type();
        let Some(descriptor) = descriptor_for(mime_type) else {
            return Ok(ConsistencyCheck::failed(format!(
                "MIME type not allowed: {}",
                mime_type
            )));
        };

        if !descriptor.matches_extension(file.name()) {
            return Ok(ConsistencyCheck::failed(format!(
                "File extension does not match type {}; expected one of: {}",
                descriptor.mime_type,
                descriptor.extensions.join(", ")
            )));
        }

        let header = file
            .read_bytes(0, descriptor.signature.required_len())
            .await?;
        if !descriptor.signature.matches(&header) {
            warn!(
                mime_type = descriptor.mime_type,
                size = file.size(),
                "File signature does not match declared type"
            );
            return Ok(ConsistencyCheck::failed(format!(
                "File content does not match declared type {} (possible spoofing)",
                descriptor.mime_type
            )));
        }

        if file.size() > descriptor.max_size {
            return Ok(ConsistencyCheck::failed(format!(
                "File exceeds maximum size of {} bytes for type {}",
                descriptor.max_size, descriptor.mime_type
            )));
        }

        Ok(ConsistencyCheck::passed())
    }
}
