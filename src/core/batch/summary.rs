//! Run summary and audit artifact
//!
//! The summary aggregates per-file outcomes into run-level counts. The
//! exported audit artifact carries aggregate detection counts and file
//! tallies only - never original values, pseudonyms tied to individuals,
//! or any pseudonym-to-original linkage.

use crate::deid::models::PhiType;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// A per-file failure recorded by the driver
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    /// Input path relative to the dataset root
    pub file: String,
    /// Failure reason
    pub reason: String,
}

/// Aggregate outcome of one dataset run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Unique identifier of this run
    pub run_id: uuid::Uuid,
    /// Run start time
    pub started_at: DateTime<Utc>,
    /// Accepted detections per category across all written files
    pub detections_by_type: HashMap<PhiType, usize>,
    /// Files written this run
    pub files_processed: usize,
    /// Files skipped because intact output already existed
    pub files_skipped: usize,
    /// Files that failed and were isolated
    pub files_failed: usize,
    /// The isolated failures, in discovery order
    pub failures: Vec<FileFailure>,
    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl RunSummary {
    /// Create a new empty run summary
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4(),
            started_at: Utc::now(),
            detections_by_type: HashMap::new(),
            files_processed: 0,
            files_skipped: 0,
            files_failed: 0,
            failures: Vec::new(),
            duration: Duration::from_secs(0),
        }
    }

    /// Record a successfully written file and its detection counts
    pub fn record_success(&mut self, detections: &HashMap<PhiType, usize>) {
        self.files_processed += 1;
        for (phi_type, count) in detections {
            *self.detections_by_type.entry(*phi_type).or_insert(0) += count;
        }
    }

    /// Record a file skipped via the integrity check
    pub fn record_skip(&mut self) {
        self.files_skipped += 1;
    }

    /// Record an isolated per-file failure
    pub fn record_failure(&mut self, file: String, reason: String) {
        self.files_failed += 1;
        self.failures.push(FileFailure { file, reason });
    }

    /// Total accepted detections across all categories
    pub fn total_detections(&self) -> usize {
        self.detections_by_type.values().sum()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Build the exportable audit record
    pub fn to_audit_record(&self) -> AuditRecord {
        AuditRecord {
            run_id: self.run_id,
            started_at: self.started_at,
            detections_by_type: self.detections_by_type.clone(),
            files_processed: self.files_processed,
            files_skipped: self.files_skipped,
            files_failed: self.files_failed,
            failed_files: self.failures.iter().map(|f| f.file.clone()).collect(),
            duration_ms: self.duration.as_millis() as u64,
        }
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-run audit artifact written next to the output dataset
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub run_id: uuid::Uuid,
    pub started_at: DateTime<Utc>,
    pub detections_by_type: HashMap<PhiType, usize>,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub failed_files: Vec<String>,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_accumulates_counts() {
        let mut summary = RunSummary::new();

        let mut counts = HashMap::new();
        counts.insert(PhiType::Name, 2);
        counts.insert(PhiType::Date, 1);
        summary.record_success(&counts);
        summary.record_success(&counts);
        summary.record_skip();
        summary.record_failure("bad.jsonl".to_string(), "malformed".to_string());

        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.detections_by_type[&PhiType::Name], 4);
        assert_eq!(summary.total_detections(), 6);
    }

    #[test]
    fn test_audit_record_has_no_value_fields() {
        let mut summary = RunSummary::new();
        let mut counts = HashMap::new();
        counts.insert(PhiType::Email, 3);
        summary.record_success(&counts);

        let record = summary.to_audit_record();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"EMAIL\":3"), "got: {json}");
        assert!(json.contains("files_processed"));
        // Aggregate counts only - no per-value data is serialized
        assert!(!json.contains("pseudonym"));
        assert!(!json.contains("original"));
    }
}
