use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

use crate::application::ports::{FileReadError, FileSource};

/// Upload spooled to local disk; only the requested range is ever read
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    mime_type: String,
    size: u64,
}

impl LocalFile {
    /// Open metadata for `path`; `name` and `mime_type` are what the client declared
    pub async fn open(
        path: impl AsRef<Path>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<Self, FileReadError> {
        let path = path.as_ref().to_path_buf();
        let metadata = fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(FileReadError::Internal(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        Ok(Self {
            path,
            name: name.into(),
            mime_type: mime_type.into(),
            size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FileSource for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read_bytes(&self, offset: u64, length: usize) -> Result<Bytes, FileReadError> {
        if offset > self.size {
            return Err(FileReadError::OutOfRange {
                offset,
                size: self.size,
            });
        }

        let wanted = length.min((self.size - offset) as usize);
        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(offset)).await?;

        let mut buffer = BytesMut::zeroed(wanted);
        let mut filled = 0;
        while filled < wanted {
            let n = file.read(&mut buffer[filled..]).await?;
            if n == 0 {
                // Truncated since open
                break;
            }
            filled += n;
        }
        buffer.truncate(filled);

        debug!(path = %self.path.display(), offset, length = filled, "Read file range");
        Ok(buffer.freeze())
    }
}
