//! In-memory blackboard.

use crate::blackboard::traits::{append_general_info, Blackboard};
use crate::core::error::BlackboardError;
use crate::core::types::{BlackboardArtifact, BlackboardAttribute, FileId};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// A blackboard that keeps every artifact in memory.
///
/// Useful for tests and for short-lived hosts that export results at the
/// end of a run.
#[derive(Debug, Default)]
pub struct MemoryBlackboard {
    artifacts: RwLock<HashMap<FileId, Vec<BlackboardArtifact>>>,
}

impl MemoryBlackboard {
    /// Creates an empty blackboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of files that have at least one artifact.
    pub fn file_count(&self) -> usize {
        self.artifacts.read().unwrap().len()
    }

    /// Removes every artifact.
    pub fn clear(&self) {
        self.artifacts.write().unwrap().clear();
    }
}

#[async_trait]
impl Blackboard for MemoryBlackboard {
    async fn add_general_info_attribute(
        &self,
        file_id: FileId,
        attribute: BlackboardAttribute,
    ) -> Result<(), BlackboardError> {
        let mut artifacts = self.artifacts.write().unwrap();
        append_general_info(artifacts.entry(file_id).or_default(), file_id, attribute);
        Ok(())
    }

    async fn artifacts(&self, file_id: FileId) -> Result<Vec<BlackboardArtifact>, BlackboardError> {
        Ok(self
            .artifacts
            .read()
            .unwrap()
            .get(&file_id)
            .cloned()
            .unwrap_or_default())
    }
}
