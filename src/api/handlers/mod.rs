pub mod files;
pub mod forms;
pub mod health;

pub use files::validate_file_handler;
pub use forms::{validate_form_handler, FormValidationResponse};
pub use health::health_handler;
