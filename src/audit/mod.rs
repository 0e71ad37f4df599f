//! Structured audit logging for forensic pipelines.
//!
//! This module provides functions for emitting structured audit events
//! using the `tracing` crate. Events are emitted with target
//! `sigbridge::audit` and can be captured by any tracing subscriber
//! (JSON file, OpenTelemetry, etc.) to keep a record of what each module
//! concluded about each file.

mod events;

pub use events::{
    emit_file_type_identified, emit_module_initialized, emit_module_run_failed,
    emit_pipeline_report, AuditEvent, IdentificationAuditEvent, ModuleStatusSummary,
};
