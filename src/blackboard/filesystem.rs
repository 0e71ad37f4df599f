//! Filesystem-based blackboard implementation.

use crate::blackboard::traits::{append_general_info, Blackboard};
use crate::core::error::BlackboardError;
use crate::core::types::{BlackboardArtifact, BlackboardAttribute, FileId};

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Filesystem-based blackboard.
///
/// Stores the artifacts of each file as one JSON document, so results
/// survive the process and can be picked up by reporting tools.
///
/// # Directory Structure
///
/// ```text
/// blackboard/
/// └── artifacts/
///     └── {file_id}.json      # All artifacts of one file
/// ```
#[derive(Debug)]
pub struct FilesystemBlackboard {
    /// Base directory for blackboard storage.
    base_path: PathBuf,
    /// In-memory index of artifacts (for fast lookups).
    index: RwLock<HashMap<FileId, Vec<BlackboardArtifact>>>,
}

impl FilesystemBlackboard {
    /// Opens a blackboard at the given path.
    ///
    /// Creates the directory structure if it doesn't exist and loads any
    /// artifacts already stored there.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, BlackboardError> {
        let base_path = base_path.into();

        std::fs::create_dir_all(base_path.join("artifacts")).map_err(|e| {
            BlackboardError::store_failed(format!("Failed to create artifacts directory: {}", e))
        })?;

        let blackboard = Self {
            base_path,
            index: RwLock::new(HashMap::new()),
        };

        blackboard.load_index()?;

        Ok(blackboard)
    }

    /// Returns the base directory.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the path to the artifacts directory.
    pub fn artifacts_dir(&self) -> PathBuf {
        self.base_path.join("artifacts")
    }

    /// Returns the number of files with stored artifacts.
    pub fn file_count(&self) -> usize {
        self.index.read().unwrap().len()
    }

    fn artifacts_path(&self, file_id: FileId) -> PathBuf {
        self.artifacts_dir().join(format!("{}.json", file_id))
    }

    /// Loads existing documents into the in-memory index.
    ///
    /// Documents that cannot be parsed are skipped with a warning.
    fn load_index(&self) -> Result<(), BlackboardError> {
        let entries = std::fs::read_dir(self.artifacts_dir())?;

        let mut index = self.index.write().unwrap();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable artifact file");
                    continue;
                }
            };

            match serde_json::from_str::<Vec<BlackboardArtifact>>(&content) {
                Ok(artifacts) => {
                    if let Some(first) = artifacts.first() {
                        index.insert(first.file_id, artifacts);
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping malformed artifact file");
                }
            }
        }

        tracing::debug!(count = index.len(), "Loaded blackboard index");
        Ok(())
    }

    /// Writes a file's artifacts to disk.
    fn save(&self, file_id: FileId, artifacts: &[BlackboardArtifact]) -> Result<(), BlackboardError> {
        let content = serde_json::to_string_pretty(artifacts)?;
        std::fs::write(self.artifacts_path(file_id), content).map_err(|e| {
            BlackboardError::store_failed(format!("Failed to write artifacts for file {}: {}", file_id, e))
        })
    }
}

#[async_trait]
impl Blackboard for FilesystemBlackboard {
    async fn add_general_info_attribute(
        &self,
        file_id: FileId,
        attribute: BlackboardAttribute,
    ) -> Result<(), BlackboardError> {
        let mut index = self.index.write().unwrap();
        let mut artifacts = index.get(&file_id).cloned().unwrap_or_default();
        append_general_info(&mut artifacts, file_id, attribute);

        // Only update the index once the document is on disk.
        self.save(file_id, &artifacts)?;
        index.insert(file_id, artifacts);

        tracing::debug!(file_id = %file_id, "Stored general info attribute");
        Ok(())
    }

    async fn artifacts(&self, file_id: FileId) -> Result<Vec<BlackboardArtifact>, BlackboardError> {
        Ok(self
            .index
            .read()
            .unwrap()
            .get(&file_id)
            .cloned()
            .unwrap_or_default())
    }
}
