//! # Sigbridge
//!
//! File-type identification by content signature for forensic file
//! pipelines, with pluggable matchers, blackboard storage, and
//! structured audit logging.
//!
//! ## Overview
//!
//! Sigbridge provides a pipeline module that looks at the first bytes of
//! every file a forensic host hands it, works out what kind of file it
//! is, and records the answer as a `TSK_FILE_TYPE_SIG` attribute. It lets
//! you:
//!
//! - Identify files with libmagic from compiled `magic.mgc` databases
//! - Fall back to a built-in magic(5) engine when libmagic data is absent
//! - Swap in any matcher implementing [`SignatureMatcher`]
//! - Post results to an in-memory or JSON-on-disk blackboard
//! - Drive one or more modules over files with [`FilePipeline`]
//! - Generate structured audit logs of every identification
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sigbridge::prelude::*;
//! use sigbridge::blackboard::MemoryBlackboard;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Loads /opt/pipeline/modules/FileTypeSigModule/magic.mgc
//!     let props = SystemProperties::new().with_module_dir("/opt/pipeline/modules");
//!     let module = FileTypeSigModule::from_properties(&props);
//!
//!     // Create the pipeline
//!     let mut pipeline = FilePipeline::builder()
//!         .add_module(module)
//!         .build()?;
//!     pipeline.initialize().await?;
//!
//!     // Identify a file
//!     let blackboard = Arc::new(MemoryBlackboard::new());
//!     let file = MemoryFile::new(FileId(1), b"%PDF-1.7\n".to_vec(), blackboard.clone());
//!     let report = pipeline.run(&file).await;
//!
//!     if report.is_ok() {
//!         println!("{:?}", blackboard.attributes(FileId(1), AttributeType::FileTypeSig).await?);
//!     }
//!
//!     pipeline.finalize().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several layers:
//!
//! - **Core**: Fundamental types, traits, and error handling
//! - **Signature**: Database parsing and content matching
//! - **Backends**: Matcher implementations
//! - **Blackboard**: Storage for posted attributes
//! - **Module**: The file-type module and its configuration
//! - **Pipeline**: Host-side driver running modules over files
//! - **Audit**: Structured logging of identifications

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod backends;
pub mod blackboard;
pub mod core;
pub mod module;
pub mod pipeline;
pub mod signature;

// Re-export commonly used types at the crate root
pub use crate::core::{
    AttributeType, BlackboardAttribute, DiskFile, FileId, Identification, MemoryFile,
    ModuleError, ModuleStatus, PipelineFile, PipelineModule, SignatureMatcher,
};

pub use crate::backends::{LibmagicMatcher, MagicMatcher};
pub use crate::blackboard::Blackboard;
pub use crate::module::{FileTypeSigModule, ModuleConfig, SystemProperties};
pub use crate::pipeline::{FilePipeline, PipelineConfig, PipelineReport};
pub use crate::signature::SignatureDatabase;

/// Prelude module for convenient imports.
///
/// ```rust
/// use sigbridge::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        AttributeType, BlackboardAttribute, DiskFile, FileId, Identification, MemoryFile,
        ModuleError, ModuleStatus, PipelineFile, PipelineModule, SignatureMatcher,
    };
    pub use crate::backends::{LibmagicMatcher, MagicMatcher};
    pub use crate::blackboard::Blackboard;
    pub use crate::module::{FileTypeSigModule, ModuleConfig, SystemProperties};
    pub use crate::pipeline::{FilePipeline, PipelineConfig, PipelineReport};
    pub use crate::signature::SignatureDatabase;
}
