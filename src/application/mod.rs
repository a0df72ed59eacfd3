pub mod builder;
pub mod file_security;
pub mod form_value;
pub mod ports;
pub mod rate_limiting;
pub mod sanitization;
pub mod scheduler;
