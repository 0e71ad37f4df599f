//! Per-file pipeline report.

use crate::core::{FileId, ModuleStatus};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What one module reported for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRunEntry {
    /// Module name.
    pub module: String,

    /// Status the module returned.
    pub status: ModuleStatus,

    /// Time spent in the module's `run`.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl ModuleRunEntry {
    /// Creates a new entry.
    pub fn new(module: impl Into<String>, status: ModuleStatus, duration: Duration) -> Self {
        Self {
            module: module.into(),
            status,
            duration,
        }
    }
}

/// The outcome of running every module on one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Unique identifier for this report.
    pub id: String,

    /// File the modules ran on.
    pub file_id: FileId,

    /// One entry per module that ran, in run order.
    pub entries: Vec<ModuleRunEntry>,

    /// When the first module started.
    pub started_at: DateTime<Utc>,

    /// When the last module finished.
    pub completed_at: DateTime<Utc>,
}

impl PipelineReport {
    /// Creates a report from the entries collected for a file.
    pub fn new(file_id: FileId, entries: Vec<ModuleRunEntry>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_id,
            entries,
            started_at,
            completed_at: Utc::now(),
        }
    }

    /// Returns the worst status any module reported.
    pub fn status(&self) -> ModuleStatus {
        self.entries
            .iter()
            .map(|e| e.status)
            .max()
            .unwrap_or(ModuleStatus::Ok)
    }

    /// Returns `true` if no module failed.
    pub fn is_ok(&self) -> bool {
        !self.entries.iter().any(|e| e.status.is_failure())
    }

    /// Returns `true` if a module asked to stop processing the file.
    pub fn stopped(&self) -> bool {
        self.entries.iter().any(|e| e.status == ModuleStatus::Stop)
    }

    /// Returns the names of the modules that failed.
    pub fn failed_modules(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.status.is_failure())
            .map(|e| e.module.as_str())
            .collect()
    }

    /// Returns the status a given module reported, if it ran.
    pub fn status_of(&self, module: &str) -> Option<ModuleStatus> {
        self.entries
            .iter()
            .find(|e| e.module == module)
            .map(|e| e.status)
    }

    /// Returns the time spent across all modules.
    pub fn total_duration(&self) -> Duration {
        self.entries.iter().map(|e| e.duration).sum()
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_micros() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u64::deserialize(deserializer)?;
        Ok(Duration::from_micros(micros))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(statuses: &[(&str, ModuleStatus)]) -> PipelineReport {
        let entries = statuses
            .iter()
            .map(|(name, status)| ModuleRunEntry::new(*name, *status, Duration::from_millis(2)))
            .collect();
        PipelineReport::new(FileId(1), entries, Utc::now())
    }

    #[test]
    fn test_report_all_ok() {
        let r = report(&[("a", ModuleStatus::Ok), ("b", ModuleStatus::Ok)]);
        assert!(r.is_ok());
        assert!(!r.stopped());
        assert_eq!(r.status(), ModuleStatus::Ok);
        assert!(r.failed_modules().is_empty());
        assert_eq!(r.total_duration(), Duration::from_millis(4));
    }

    #[test]
    fn test_report_worst_status() {
        let r = report(&[
            ("a", ModuleStatus::Stop),
            ("b", ModuleStatus::Fail),
            ("c", ModuleStatus::Ok),
        ]);
        assert!(!r.is_ok());
        assert!(r.stopped());
        assert_eq!(r.status(), ModuleStatus::Fail);
        assert_eq!(r.failed_modules(), vec!["b"]);
        assert_eq!(r.status_of("a"), Some(ModuleStatus::Stop));
        assert_eq!(r.status_of("missing"), None);
    }

    #[test]
    fn test_report_serialization() {
        let r = report(&[("FileTypeSigModule", ModuleStatus::Ok)]);
        let json = serde_json::to_value(&r).unwrap();

        assert_eq!(json["file_id"], 1);
        assert_eq!(json["entries"][0]["status"], "ok");
        assert_eq!(json["entries"][0]["duration"], 2000);

        let back: PipelineReport = serde_json::from_value(json).unwrap();
        assert_eq!(back.entries, r.entries);
    }
}
