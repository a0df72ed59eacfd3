mod in_memory;
mod local;

pub use in_memory::InMemoryFile;
pub use local::LocalFile;
