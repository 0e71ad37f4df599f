//! Audit event types and emission functions.

use crate::core::{FileId, Identification, ModuleError};
use crate::pipeline::PipelineReport;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base trait for audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp of the event.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Audit event for a file whose type was identified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentificationAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Module that made the identification.
    pub module: String,

    /// File that was identified.
    pub file_id: FileId,

    /// Label posted to the blackboard.
    pub label: String,

    /// MIME type, if the matcher reported one.
    pub mime: Option<String>,

    /// Number of bytes handed to the matcher.
    pub bytes_examined: usize,
}

impl IdentificationAuditEvent {
    /// Creates a new event stamped with the current time.
    pub fn new(
        module: impl Into<String>,
        file_id: FileId,
        label: impl Into<String>,
        identification: &Identification,
        bytes_examined: usize,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            module: module.into(),
            file_id,
            label: label.into(),
            mime: identification.mime.clone(),
            bytes_examined,
        }
    }
}

impl AuditEvent for IdentificationAuditEvent {
    fn event_type(&self) -> &'static str {
        "file_type_identified"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Summary of one module's outcome for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleStatusSummary {
    /// Module name.
    pub module: String,
    /// Reported status.
    pub status: String,
    /// Time spent in the module, in milliseconds.
    pub duration_ms: u64,
}

/// Emits an audit event for a module that finished initializing.
pub fn emit_module_initialized(module: &str, version: &str, database: Option<&str>) {
    tracing::info!(
        target: "sigbridge::audit",
        event_type = "module_initialized",
        module = %module,
        version = %version,
        database = ?database,
        "Module initialized"
    );
}

/// Emits an audit event for a posted identification.
pub fn emit_file_type_identified(event: &IdentificationAuditEvent) {
    tracing::info!(
        target: "sigbridge::audit",
        event_type = event.event_type(),
        module = %event.module,
        file_id = %event.file_id,
        label = %event.label,
        mime = ?event.mime,
        bytes_examined = event.bytes_examined,
        "File type identified"
    );
}

/// Emits an audit event for a module run that failed.
pub fn emit_module_run_failed(module: &str, file_id: FileId, error: &ModuleError) {
    tracing::warn!(
        target: "sigbridge::audit",
        event_type = "module_run_failed",
        module = %module,
        file_id = %file_id,
        error = %error,
        permanent = error.is_permanent(),
        "Module run failed"
    );
}

/// Emits an audit event for a pipeline report (all modules on one file).
pub fn emit_pipeline_report(report: &PipelineReport) {
    let modules: Vec<ModuleStatusSummary> = report
        .entries
        .iter()
        .map(|entry| ModuleStatusSummary {
            module: entry.module.clone(),
            status: entry.status.to_string(),
            duration_ms: entry.duration.as_millis() as u64,
        })
        .collect();

    tracing::info!(
        target: "sigbridge::audit",
        event_type = "pipeline_report",
        report_id = %report.id,
        file_id = %report.file_id,
        status = %report.status(),
        modules = ?modules,
        module_count = modules.len(),
        failed = ?report.failed_modules(),
        total_duration_ms = report.total_duration().as_millis() as u64,
        "Pipeline report generated"
    );
}
