//! Core traits for the sigbridge library.
//!
//! These traits are the seams between the file-type module and its
//! surroundings: the pipeline host drives a [`PipelineModule`], hands it
//! [`PipelineFile`]s, and the module delegates type detection to a
//! [`SignatureMatcher`].

use crate::core::error::{BlackboardError, FileError, MatchError};
use crate::core::types::{BlackboardAttribute, FileId, Identification, ModuleInfo, ModuleStatus};

use async_trait::async_trait;
use std::fmt::Debug;

/// A module that the pipeline host runs on every file.
///
/// The lifecycle is `initialize` once, `run` for each file, `finalize`
/// once. Modules never return errors to the host; failures are logged and
/// reported as [`ModuleStatus::Fail`].
///
/// # Example Implementation
///
/// ```rust,ignore
/// use sigbridge::core::{ModuleInfo, ModuleStatus, PipelineFile, PipelineModule};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct SizeModule {
///     info: ModuleInfo,
/// }
///
/// #[async_trait]
/// impl PipelineModule for SizeModule {
///     fn info(&self) -> &ModuleInfo {
///         &self.info
///     }
///
///     async fn initialize(&mut self, _arguments: &str) -> ModuleStatus {
///         ModuleStatus::Ok
///     }
///
///     async fn run(&self, file: &dyn PipelineFile) -> ModuleStatus {
///         tracing::info!(size = file.size(), "seen file");
///         ModuleStatus::Ok
///     }
///
///     async fn finalize(&mut self) -> ModuleStatus {
///         ModuleStatus::Ok
///     }
/// }
/// ```
#[async_trait]
pub trait PipelineModule: Send + Sync + Debug {
    /// Returns the module identification.
    fn info(&self) -> &ModuleInfo;

    /// Returns the module name.
    fn name(&self) -> &str {
        &self.info().name
    }

    /// Returns the module description.
    fn description(&self) -> &str {
        &self.info().description
    }

    /// Returns the module version.
    fn version(&self) -> &str {
        &self.info().version
    }

    /// Prepares the module. `arguments` is the host's free-form argument
    /// string for this module.
    async fn initialize(&mut self, arguments: &str) -> ModuleStatus;

    /// Processes one file.
    async fn run(&self, file: &dyn PipelineFile) -> ModuleStatus;

    /// Releases resources acquired by `initialize`.
    async fn finalize(&mut self) -> ModuleStatus;
}

/// The host's view of a file being processed.
#[async_trait]
pub trait PipelineFile: Send + Sync + Debug {
    /// Returns the host identifier of this file.
    fn id(&self) -> FileId;

    /// Returns the file name, if known.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Returns the size of the file content in bytes.
    fn size(&self) -> u64;

    /// Reads content starting at `offset` into `buf`.
    ///
    /// Returns the number of bytes read; `0` means no content is left.
    async fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize, FileError>;

    /// Appends an attribute to this file's general-info artifact.
    async fn add_general_info_attribute(
        &self,
        attribute: BlackboardAttribute,
    ) -> Result<(), BlackboardError>;
}

/// A content-signature matcher.
///
/// Implementations must be `Send + Sync`: the module shares a single
/// matcher across every `run` call.
pub trait SignatureMatcher: Send + Sync + Debug {
    /// Returns the name of this matcher.
    fn name(&self) -> &str;

    /// Identifies the type of content from its leading bytes.
    fn identify(&self, buffer: &[u8]) -> Result<Identification, MatchError>;

    /// Returns a version string for the loaded signatures, if available.
    fn database_version(&self) -> Option<String> {
        None
    }
}

/// A boxed module for type-erased storage.
pub type BoxedModule = Box<dyn PipelineModule>;

/// An arc-wrapped matcher for shared ownership.
pub type ArcMatcher = std::sync::Arc<dyn SignatureMatcher>;
