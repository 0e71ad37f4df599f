//! Host-side driver that runs pipeline modules over files.
//!
//! The `FilePipeline` plays the role of the forensic host: it initializes
//! each registered module once, runs them in order on every file, and
//! records what each module reported.

mod file_pipeline;
mod report;

pub use file_pipeline::{FilePipeline, FilePipelineBuilder, PipelineConfig};
pub use report::{ModuleRunEntry, PipelineReport};
