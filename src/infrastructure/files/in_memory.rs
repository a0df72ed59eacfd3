use async_trait::async_trait;
use bytes::Bytes;

use crate::application::ports::{FileReadError, FileSource};

/// Upload whose body is already buffered, e.g. a request body or multipart part
#[derive(Debug, Clone)]
pub struct InMemoryFile {
    name: String,
    mime_type: String,
    data: Bytes,
}

impl InMemoryFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

#[async_trait]
impl FileSource for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read_bytes(&self, offset: u64, length: usize) -> Result<Bytes, FileReadError> {
        let size = self.size();
        if offset > size {
            return Err(FileReadError::OutOfRange { offset, size });
        }
        let start = offset as usize;
        let end = start.saturating_add(length).min(self.data.len());
        // Zero-copy slice of the shared buffer
        Ok(self.data.slice(start..end))
    }
}
