mod environment;
mod file_type;
mod limit_type;
mod verdicts;

pub use environment::Environment;
pub use file_type::{
    descriptor_for, is_legacy_allowed_type, registered_mime_types, FileTypeDescriptor,
    SignatureCheck, LEGACY_ALLOWED_TYPES,
};
pub use limit_type::{LimitType, RateLimitPolicies, RateLimitPolicy};
pub use verdicts::{FileValidationResult, RateLimitResult, SanitizationResult};
