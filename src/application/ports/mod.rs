mod clock;
mod file_source;
mod rate_limit_backend;
mod sliding_window;

pub use clock::Clock;
pub use file_source::{FileReadError, FileSource};
pub use rate_limit_backend::{RateLimitBackend, RateLimitError};
pub use sliding_window::{SlidingWindowClient, SlidingWindowResponse};

#[cfg(test)]
pub use file_source::MockFileSource;
#[cfg(test)]
pub use rate_limit_backend::MockRateLimitBackend;
#[cfg(test)]
pub use sliding_window::MockSlidingWindowClient;
