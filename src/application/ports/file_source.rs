use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::{automock, predicate::*};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Read offset {offset} is beyond file size {size}")]
    OutOfRange { offset: u64, size: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Port for an uploaded file handle.
///
/// Only metadata and bounded reads are exposed; validators never need the
/// whole body in memory.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Client-supplied file name (untrusted)
    fn name(&self) -> &str;

    /// Declared MIME type (untrusted)
    fn mime_type(&self) -> &str;

    /// Size in bytes
    fn size(&self) -> u64;

    /// Read up to `length` bytes starting at `offset`; fewer are returned at end of file
    async fn read_bytes(&self, offset: u64, length: usize) -> Result<Bytes, FileReadError>;
}
