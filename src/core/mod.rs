//! Core types and traits for the sigbridge library.
//!
//! This module provides the fundamental building blocks used throughout
//! the library:
//!
//! - [`types`] - Module status, file ids, blackboard attributes
//! - [`traits`] - The `PipelineModule`, `PipelineFile` and `SignatureMatcher` traits
//! - [`error`] - Structured error types
//! - [`input`] - In-memory and on-disk file implementations
//! - [`sanitize`] - UTF-8 cleanup of posted labels

pub mod error;
pub mod input;
pub mod sanitize;
pub mod traits;
pub mod types;

// Re-export commonly used types at the core level
pub use error::{
    BlackboardError, FileError, MatchError, ModuleError, ModuleResult, SignatureError,
};
pub use input::{DiskFile, MemoryFile};
pub use sanitize::{clean_label, clean_utf8};
pub use traits::{ArcMatcher, BoxedModule, PipelineFile, PipelineModule, SignatureMatcher};
pub use types::{
    ArtifactType, AttributeType, AttributeValue, BlackboardArtifact, BlackboardAttribute, FileId,
    Identification, ModuleInfo, ModuleStatus,
};
