//! File implementations handed to pipeline modules.
//!
//! [`MemoryFile`] holds its content in memory and [`DiskFile`] reads from a
//! path on disk. Both post attributes to a shared [`Blackboard`].

use crate::blackboard::Blackboard;
use crate::core::error::{BlackboardError, FileError};
use crate::core::traits::PipelineFile;
use crate::core::types::{BlackboardAttribute, FileId};

use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// A file whose content is held in memory.
///
/// # Examples
///
/// ```rust
/// use sigbridge::blackboard::MemoryBlackboard;
/// use sigbridge::core::{FileId, MemoryFile, PipelineFile};
/// use std::sync::Arc;
///
/// let blackboard = Arc::new(MemoryBlackboard::new());
/// let file = MemoryFile::new(FileId(1), b"%PDF-1.7".to_vec(), blackboard)
///     .with_name("report.pdf");
/// assert_eq!(file.size(), 8);
/// ```
pub struct MemoryFile {
    id: FileId,
    name: Option<String>,
    data: Vec<u8>,
    blackboard: Arc<dyn Blackboard>,
}

impl std::fmt::Debug for MemoryFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("data_len", &self.data.len())
            .finish_non_exhaustive()
    }
}

impl MemoryFile {
    /// Creates a new in-memory file.
    pub fn new(id: FileId, data: impl Into<Vec<u8>>, blackboard: Arc<dyn Blackboard>) -> Self {
        Self {
            id,
            name: None,
            data: data.into(),
            blackboard,
        }
    }

    /// Sets the file name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the file content.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[async_trait]
impl PipelineFile for MemoryFile {
    fn id(&self) -> FileId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize, FileError> {
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(self.data.len());
        let remaining = &self.data[start..];
        let to_copy = std::cmp::min(buf.len(), remaining.len());
        buf[..to_copy].copy_from_slice(&remaining[..to_copy]);
        Ok(to_copy)
    }

    async fn add_general_info_attribute(
        &self,
        attribute: BlackboardAttribute,
    ) -> Result<(), BlackboardError> {
        self.blackboard
            .add_general_info_attribute(self.id, attribute)
            .await
    }
}

/// A file read from a path on disk.
///
/// The size is taken from the filesystem when the file is opened.
pub struct DiskFile {
    id: FileId,
    path: PathBuf,
    size: u64,
    blackboard: Arc<dyn Blackboard>,
}

impl std::fmt::Debug for DiskFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskFile")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl DiskFile {
    /// Opens a file on disk.
    pub async fn open(
        id: FileId,
        path: impl Into<PathBuf>,
        blackboard: Arc<dyn Blackboard>,
    ) -> Result<Self, FileError> {
        let path = path.into();
        let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FileError::NotFound {
                    path: path.display().to_string(),
                }
            } else {
                FileError::Io(e)
            }
        })?;

        if !metadata.is_file() {
            return Err(FileError::ReadFailed {
                file_id: id,
                reason: format!("{} is not a regular file", path.display()),
            });
        }

        Ok(Self {
            id,
            path,
            size: metadata.len(),
            blackboard,
        })
    }

    /// Returns the path of this file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PipelineFile for DiskFile {
    fn id(&self) -> FileId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize, FileError> {
        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(offset)).await?;

        let mut filled = 0;
        while filled < buf.len() {
            let n = file.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        Ok(filled)
    }

    async fn add_general_info_attribute(
        &self,
        attribute: BlackboardAttribute,
    ) -> Result<(), BlackboardError> {
        self.blackboard
            .add_general_info_attribute(self.id, attribute)
            .await
    }
}
