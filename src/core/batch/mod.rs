//! Dataset batch driver
//!
//! Walks an input tree, applies the de-identification engine per file while
//! mirroring the directory structure under the output root, isolates
//! per-file failures, checkpoints the mapping store, and writes the per-run
//! audit artifact.

pub mod summary;

pub use summary::{AuditRecord, FileFailure, RunSummary};

use crate::config::ShroudConfig;
use crate::deid::engine::{DeidentificationEngine, FileOutcome};
use crate::deid::models::ResidualFinding;
use crate::domain::{Result, ShroudError};
use crate::store::MappingStore;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Recursively discover newline-delimited JSON files under `root`.
///
/// Only `*.jsonl` and `*.ndjson` files are processed; discovery order is
/// sorted so runs are deterministic.
pub fn discover_jsonl_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(ShroudError::Io(format!(
            "Input root is not a directory: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    walk(root, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)
        .map_err(|e| ShroudError::Io(format!("Failed to read directory {}: {e}", dir.display())))?
    {
        let path = entry
            .map_err(|e| ShroudError::Io(format!("Failed to read entry in {}: {e}", dir.display())))?
            .path();
        if path.is_dir() {
            walk(&path, out)?;
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("jsonl") | Some("ndjson")
        ) {
            out.push(path);
        }
    }
    Ok(())
}

/// Batch driver: one engine, one run, one summary
pub struct DatasetDriver {
    engine: DeidentificationEngine,
    checkpoint_every: usize,
    audit_enabled: bool,
    audit_artifact_name: String,
}

impl DatasetDriver {
    /// Construct the driver from validated configuration.
    ///
    /// Opens the mapping store (fatal on crypto failure) and builds the
    /// engine (fatal on pattern/configuration failure).
    pub fn new(config: &ShroudConfig) -> Result<Self> {
        let store = MappingStore::open(&config.mapping)?;
        let engine = DeidentificationEngine::new(&config.deidentification, store)?;

        Ok(Self {
            engine,
            checkpoint_every: config.mapping.checkpoint_every,
            audit_enabled: config.audit.enabled,
            audit_artifact_name: config.audit.artifact_name.clone(),
        })
    }

    /// The engine's fixed date offset for this run.
    pub fn date_offset_days(&self) -> i64 {
        self.engine.date_offset_days()
    }

    /// Process every discovered file under `input_root`, mirroring the
    /// relative layout under `output_root`.
    ///
    /// Per-file failures (unreadable input, malformed JSON) are counted and
    /// logged, and the run continues. Fatal failures (configuration,
    /// crypto, store checkpointing) abort immediately.
    pub async fn run(&mut self, input_root: &Path, output_root: &Path) -> Result<RunSummary> {
        let start = Instant::now();
        let mut summary = RunSummary::new();

        let files = discover_jsonl_files(input_root)?;
        if files.is_empty() {
            tracing::warn!(root = %input_root.display(), "No .jsonl/.ndjson files found under input root");
        }

        tracing::info!(
            run_id = %summary.run_id,
            files = files.len(),
            offset_days = self.engine.date_offset_days(),
            "Starting de-identification run"
        );

        for input_path in &files {
            let relative = input_path
                .strip_prefix(input_root)
                .map_err(|e| ShroudError::Other(format!("Path outside input root: {e}")))?;
            let output_path = output_root.join(relative);

            match self.engine.process_file(input_path, &output_path).await {
                Ok(FileOutcome::Written { lines, detections }) => {
                    tracing::info!(
                        file = %relative.display(),
                        lines,
                        detections = detections.values().sum::<usize>(),
                        "File de-identified"
                    );
                    summary.record_success(&detections);
                    if summary.files_processed % self.checkpoint_every == 0 {
                        self.engine.checkpoint()?;
                    }
                }
                Ok(FileOutcome::SkippedIntact) => {
                    tracing::info!(file = %relative.display(), "Skipped intact output");
                    summary.record_skip();
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::error!(file = %relative.display(), error = %e, "File failed; continuing");
                    summary.record_failure(relative.display().to_string(), e.to_string());
                }
            }
        }

        // Store always persisted at run end
        self.engine.checkpoint()?;

        let summary = summary.with_duration(start.elapsed());

        if self.audit_enabled {
            self.write_audit_artifact(output_root, &summary).await?;
        }

        tracing::info!(
            run_id = %summary.run_id,
            files_processed = summary.files_processed,
            files_skipped = summary.files_skipped,
            files_failed = summary.files_failed,
            detections = summary.total_detections(),
            "Run complete"
        );

        Ok(summary)
    }

    /// Re-scan output for residual PHI-shaped strings.
    pub fn validate(&self, output_root: &Path) -> Result<Vec<ResidualFinding>> {
        self.engine.validate_dataset(output_root)
    }

    async fn write_audit_artifact(
        &self,
        output_root: &Path,
        summary: &RunSummary,
    ) -> Result<()> {
        let record = summary.to_audit_record();
        let path = output_root.join(&self.audit_artifact_name);

        tokio::fs::create_dir_all(output_root).await.map_err(|e| {
            ShroudError::Io(format!(
                "Failed to create output root {}: {e}",
                output_root.display()
            ))
        })?;

        let json = serde_json::to_string_pretty(&record)?;
        tokio::fs::write(&path, json).await.map_err(|e| {
            ShroudError::Io(format!(
                "Failed to write audit artifact {}: {e}",
                path.display()
            ))
        })?;

        tracing::info!(path = %path.display(), "Audit artifact written");
        Ok(())
    }
}
