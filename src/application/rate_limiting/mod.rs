//! Rate limiting façade and client identity

pub mod client_identifier;
pub mod limiter;

pub use client_identifier::get_client_identifier;
pub use limiter::RateLimiter;
