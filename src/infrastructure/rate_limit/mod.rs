mod distributed;
mod memory;

pub use distributed::DistributedRateLimitBackend;
pub use memory::MemoryRateLimitBackend;
