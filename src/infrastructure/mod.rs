pub mod clock;
pub mod files;
pub mod rate_limit;

pub use clock::{ManualClock, SystemClock};
pub use files::{InMemoryFile, LocalFile};
pub use rate_limit::{DistributedRateLimitBackend, MemoryRateLimitBackend};
