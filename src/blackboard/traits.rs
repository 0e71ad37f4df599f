//! Blackboard trait definition.

use crate::core::error::BlackboardError;
use crate::core::types::{
    ArtifactType, AttributeType, BlackboardArtifact, BlackboardAttribute, FileId,
};

use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for blackboard implementations.
///
/// A blackboard stores the facts modules extract about files. Facts are
/// attributes grouped into artifacts; each file has at most one
/// general-info artifact, which collects attributes that describe the
/// file itself.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use sigbridge::blackboard::Blackboard;
/// use sigbridge::core::{BlackboardArtifact, BlackboardAttribute, BlackboardError, FileId};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct CaseDatabase {
///     // Your storage implementation
/// }
///
/// #[async_trait]
/// impl Blackboard for CaseDatabase {
///     async fn add_general_info_attribute(
///         &self,
///         file_id: FileId,
///         attribute: BlackboardAttribute,
///     ) -> Result<(), BlackboardError> {
///         todo!()
///     }
///
///     async fn artifacts(
///         &self,
///         file_id: FileId,
///     ) -> Result<Vec<BlackboardArtifact>, BlackboardError> {
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait Blackboard: Send + Sync + Debug {
    /// Appends an attribute to the file's general-info artifact, creating
    /// the artifact on first use.
    async fn add_general_info_attribute(
        &self,
        file_id: FileId,
        attribute: BlackboardAttribute,
    ) -> Result<(), BlackboardError>;

    /// Returns every artifact recorded for a file.
    async fn artifacts(&self, file_id: FileId) -> Result<Vec<BlackboardArtifact>, BlackboardError>;

    /// Returns the attributes of one type recorded for a file, across all
    /// of its artifacts.
    async fn attributes(
        &self,
        file_id: FileId,
        attribute_type: AttributeType,
    ) -> Result<Vec<BlackboardAttribute>, BlackboardError> {
        let artifacts = self.artifacts(file_id).await?;
        Ok(artifacts
            .iter()
            .flat_map(|a| a.attributes_of(attribute_type))
            .cloned()
            .collect())
    }
}

/// Appends `attribute` to the general-info artifact in `artifacts`.
pub(crate) fn append_general_info(
    artifacts: &mut Vec<BlackboardArtifact>,
    file_id: FileId,
    attribute: BlackboardAttribute,
) {
    match artifacts
        .iter_mut()
        .find(|a| a.artifact_type == ArtifactType::GenInfo)
    {
        Some(artifact) => artifact.attributes.push(attribute),
        None => {
            let mut artifact = BlackboardArtifact::new(file_id, ArtifactType::GenInfo);
            artifact.attributes.push(attribute);
            artifacts.push(artifact);
        }
    }
}
