//! De-identification engine
//!
//! The engine orchestrates pattern matching against text fields, routes
//! replacements (dates to the [`DateShifter`], everything else to the
//! [`PseudonymGenerator`]), records every fresh association with the
//! [`MappingStore`], and applies itself per record and per file.
//!
//! # Overlap policy
//!
//! When several patterns match overlapping spans in one text, resolution is:
//! leftmost match start wins; among matches starting at the same offset,
//! highest priority wins; remaining ties go to the longest match. Scanning
//! continues after the end of each accepted span, so replacement output is
//! never re-scanned.

use crate::config::schema::DeidentificationConfig;
use crate::core::verification::{is_output_intact, write_sidecar};
use crate::deid::dateshift::DateShifter;
use crate::deid::models::{Detection, PhiType};
use crate::deid::patterns::PatternLibrary;
use crate::deid::pseudonym::PseudonymGenerator;
use crate::domain::{Result, ShroudError};
use crate::store::MappingStore;
use secrecy::ExposeSecret;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Result of processing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Output written; counts of accepted detections per category
    Written {
        lines: usize,
        detections: HashMap<PhiType, usize>,
    },
    /// A complete, checksum-verified output already existed
    SkippedIntact,
}

/// De-identification engine for one run
///
/// Owns all run-scoped mutable state: the pseudonym cache and counters, the
/// date-shift offset and cache, and the mapping store. One engine is created
/// per run and discarded at completion; the store file is the only state
/// that outlives it.
pub struct DeidentificationEngine {
    library: PatternLibrary,
    pseudonyms: PseudonymGenerator,
    dates: DateShifter,
    store: MappingStore,
    passthrough: HashSet<String>,
}

impl DeidentificationEngine {
    /// Build an engine from validated configuration and an opened store.
    ///
    /// Loads the pattern library for the configured countries, derives the
    /// pseudonym salt and date-shift offset from the run seed, and hydrates
    /// the pseudonym cache from the store so previously mapped values keep
    /// their pseudonyms.
    pub fn new(config: &DeidentificationConfig, store: MappingStore) -> Result<Self> {
        let library = PatternLibrary::load(&config.countries)?;

        let seed = config.seed.expose_secret();
        let salt = Sha256::new()
            .chain_update(b"pseudonym:")
            .chain_update(seed.as_bytes())
            .finalize()
            .to_vec();

        let mut pseudonyms = PseudonymGenerator::new(salt);
        store.hydrate(&mut pseudonyms);

        let dates = DateShifter::new(
            config.primary_country(),
            seed.as_bytes(),
            config.date_shift_range_days,
        );

        Ok(Self {
            library,
            pseudonyms,
            dates,
            store,
            passthrough: config.passthrough_fields.iter().cloned().collect(),
        })
    }

    /// The fixed day-offset applied to every date this run.
    pub fn date_offset_days(&self) -> i64 {
        self.dates.offset_days()
    }

    /// Pattern library in use.
    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    /// Read access to the mapping store.
    pub fn store(&self) -> &MappingStore {
        &self.store
    }

    /// Persist the mapping store (checkpoint or shutdown).
    pub fn checkpoint(&mut self) -> Result<()> {
        self.store.save()
    }

    /// De-identify one text value.
    ///
    /// Returns the rewritten text and the list of accepted detections with
    /// spans into the ORIGINAL text.
    pub fn process_text(&mut self, text: &str) -> (String, Vec<Detection>) {
        let detections = resolve_matches(&self.library, text);
        if detections.is_empty() {
            return (text.to_string(), detections);
        }

        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;

        for detection in &detections {
            output.push_str(&text[cursor..detection.start]);
            let matched = &text[detection.start..detection.end];

            let replacement = if detection.phi_type == PhiType::Date {
                self.dates.shift(matched)
            } else {
                let pseudonym = self.pseudonyms.generate(detection.phi_type, matched);
                // Registered before the pseudonym ever reaches output
                self.store
                    .add_mapping(detection.phi_type, matched, &pseudonym, HashMap::new());
                pseudonym
            };

            output.push_str(&replacement);
            cursor = detection.end;
        }
        output.push_str(&text[cursor..]);

        (output, detections)
    }

    /// De-identify every string field of one flat JSON record.
    ///
    /// Passthrough provenance fields and non-string values are preserved
    /// verbatim.
    pub fn process_record(&mut self, record: Value) -> Result<(Value, Vec<Detection>)> {
        let map = match record {
            Value::Object(map) => map,
            other => {
                return Err(ShroudError::Serialization(format!(
                    "Expected a JSON object per line, got: {}",
                    value_kind(&other)
                )))
            }
        };

        let mut detections = Vec::new();
        let mut output = serde_json::Map::with_capacity(map.len());

        for (key, value) in map {
            match value {
                Value::String(text) if !self.passthrough.contains(&key) => {
                    let (rewritten, mut found) = self.process_text(&text);
                    detections.append(&mut found);
                    output.insert(key, Value::String(rewritten));
                }
                other => {
                    output.insert(key, other);
                }
            }
        }

        Ok((Value::Object(output), detections))
    }

    /// De-identify one newline-delimited JSON file, preserving line order.
    ///
    /// If a complete, checksum-verified output already exists at
    /// `output_path` the file is skipped, which makes interrupted batches
    /// safely resumable. Malformed JSON on any line fails this file only.
    pub async fn process_file(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<FileOutcome> {
        if is_output_intact(output_path) {
            tracing::debug!(
                output = %output_path.display(),
                "Intact output already present; skipping"
            );
            return Ok(FileOutcome::SkippedIntact);
        }

        let content = tokio::fs::read_to_string(input_path).await.map_err(|e| {
            ShroudError::Io(format!("Failed to read {}: {e}", input_path.display()))
        })?;

        let mut detections_by_type: HashMap<PhiType, usize> = HashMap::new();
        let mut lines_out = String::with_capacity(content.len());
        let mut lines = 0;

        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: Value = serde_json::from_str(line).map_err(|e| {
                ShroudError::Serialization(format!(
                    "Malformed JSON at {}:{}: {e}",
                    input_path.display(),
                    idx + 1
                ))
            })?;

            let (rewritten, detections) = self.process_record(record)?;
            for detection in &detections {
                *detections_by_type.entry(detection.phi_type).or_insert(0) += 1;
            }

            lines_out.push_str(&serde_json::to_string(&rewritten)?);
            lines_out.push('\n');
            lines += 1;
        }

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ShroudError::Io(format!(
                    "Failed to create output directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        tokio::fs::write(output_path, &lines_out).await.map_err(|e| {
            ShroudError::Io(format!("Failed to write {}: {e}", output_path.display()))
        })?;
        write_sidecar(output_path)?;

        Ok(FileOutcome::Written {
            lines,
            detections: detections_by_type,
        })
    }

    /// Re-scan already-de-identified output for residual PHI-shaped strings.
    ///
    /// Acceptance-gate signal, not a compliance guarantee.
    pub fn validate_dataset(
        &self,
        output_root: &Path,
    ) -> Result<Vec<crate::deid::models::ResidualFinding>> {
        crate::core::verification::scan_dataset(&self.library, output_root)
    }
}

/// Collect all pattern matches in `text` and resolve overlaps: leftmost
/// start, then highest priority, then longest match.
pub fn resolve_matches(library: &PatternLibrary, text: &str) -> Vec<Detection> {
    let mut candidates: Vec<(usize, usize, i32, PhiType)> = Vec::new();
    for pattern in library.all_patterns() {
        for m in pattern.regex.find_iter(text) {
            candidates.push((m.start(), m.end(), pattern.priority, pattern.phi_type));
        }
    }

    candidates.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| b.2.cmp(&a.2))
            .then_with(|| (b.1 - b.0).cmp(&(a.1 - a.0)))
    });

    let mut accepted = Vec::new();
    let mut cursor = 0;
    for (start, end, _, phi_type) in candidates {
        if start >= cursor {
            accepted.push(Detection {
                phi_type,
                start,
                end,
            });
            cursor = end;
        }
    }
    accepted
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::config::MappingConfig;
    use crate::domain::CountryCode;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_engine(dir: &TempDir, countries: Vec<CountryCode>) -> DeidentificationEngine {
        let store = MappingStore::open(&MappingConfig {
            path: dir.path().join("mappings.shroud"),
            encryption_enabled: true,
            key: Some(secret_string("engine-test-key".to_string())),
            checkpoint_every: 25,
        })
        .unwrap();

        DeidentificationEngine::new(
            &DeidentificationConfig {
                countries,
                seed: secret_string("engine-test-seed".to_string()),
                date_shift_range_days: 365,
                passthrough_fields: vec!["source_file".to_string()],
            },
            store,
        )
        .unwrap()
    }

    #[test]
    fn test_process_text_replaces_email() {
        let dir = TempDir::new().unwrap();
        let mut engine = test_engine(&dir, vec![CountryCode::In]);

        let (output, detections) = engine.process_text("Contact: john.doe@example.com");
        assert!(!output.contains("john.doe@example.com"));
        assert!(output.contains("EMAIL-"));
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].phi_type, PhiType::Email);
    }

    #[test]
    fn test_process_text_is_deterministic_for_repeats() {
        let dir = TempDir::new().unwrap();
        let mut engine = test_engine(&dir, vec![CountryCode::In]);

        let (first, _) = engine.process_text("mail a@example.com");
        let (second, _) = engine.process_text("mail a@example.com");
        assert_eq!(first, second);
    }

    #[test]
    fn test_dates_are_shifted_not_pseudonymized() {
        let dir = TempDir::new().unwrap();
        let mut engine = test_engine(&dir, vec![CountryCode::In]);
        let offset = engine.date_offset_days();

        let (output, detections) = engine.process_text("admitted 2020-05-13");
        assert_eq!(detections[0].phi_type, PhiType::Date);

        let expected = chrono::NaiveDate::from_ymd_opt(2020, 5, 13).unwrap()
            + chrono::Duration::days(offset);
        assert_eq!(output, format!("admitted {}", expected.format("%Y-%m-%d")));
    }

    #[test]
    fn test_overlap_same_start_highest_priority_wins() {
        let dir = TempDir::new().unwrap();
        let engine = test_engine(&dir, vec![CountryCode::Us]);

        // "123-45-6789" matches SSN (priority 100) and also the generic
        // numeric date pattern cannot claim it; ensure one detection at
        // the SSN priority.
        let detections = resolve_matches(engine.library(), "ssn 123-45-6789");
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].phi_type, PhiType::NationalId);
    }

    #[test]
    fn test_overlap_leftmost_wins() {
        let dir = TempDir::new().unwrap();
        let engine = test_engine(&dir, vec![]);

        // The name match starts before the email inside the same span
        let text = "John Doe <j@x.com>";
        let detections = resolve_matches(engine.library(), text);
        assert_eq!(detections[0].phi_type, PhiType::Name);
        assert_eq!(detections[0].start, 0);
        // Email begins after the name ends, so both are accepted
        assert!(detections.iter().any(|d| d.phi_type == PhiType::Email));
    }

    #[test]
    fn test_no_rescan_of_replacements() {
        let dir = TempDir::new().unwrap();
        let mut engine = test_engine(&dir, vec![CountryCode::In]);

        // A replacement pseudonym must not itself be matched and rewritten
        let (once, _) = engine.process_text("Patient John Doe");
        let (twice, _) = engine.process_text(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_process_record_passthrough_and_non_strings() {
        let dir = TempDir::new().unwrap();
        let mut engine = test_engine(&dir, vec![CountryCode::In]);

        let record = json!({
            "name": "John Doe",
            "age": 42,
            "active": true,
            "source_file": "a.xlsx"
        });
        let (output, detections) = engine.process_record(record).unwrap();

        assert_eq!(output["age"], json!(42));
        assert_eq!(output["active"], json!(true));
        assert_eq!(output["source_file"], json!("a.xlsx"));
        assert!(output["name"].as_str().unwrap().starts_with("PATIENT-"));
        assert_eq!(detections.len(), 1);
    }

    #[test]
    fn test_process_record_rejects_non_object() {
        let dir = TempDir::new().unwrap();
        let mut engine = test_engine(&dir, vec![CountryCode::In]);
        let err = engine.process_record(json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, ShroudError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_process_file_writes_and_then_skips() {
        let dir = TempDir::new().unwrap();
        let mut engine = test_engine(&dir, vec![CountryCode::In]);

        let input = dir.path().join("input.jsonl");
        let output = dir.path().join("out/input.jsonl");
        std::fs::write(&input, "{\"name\":\"John Doe\"}\n{\"name\":\"Jane Roe\"}\n").unwrap();

        let outcome = engine.process_file(&input, &output).await.unwrap();
        match outcome {
            FileOutcome::Written { lines, detections } => {
                assert_eq!(lines, 2);
                assert_eq!(detections[&PhiType::Name], 2);
            }
            other => panic!("expected Written, got {other:?}"),
        }

        // Second run resumes past the intact output
        let outcome = engine.process_file(&input, &output).await.unwrap();
        assert_eq!(outcome, FileOutcome::SkippedIntact);
    }

    #[tokio::test]
    async fn test_process_file_malformed_json_fails_that_file() {
        let dir = TempDir::new().unwrap();
        let mut engine = test_engine(&dir, vec![CountryCode::In]);

        let input = dir.path().join("bad.jsonl");
        let output = dir.path().join("out/bad.jsonl");
        std::fs::write(&input, "{\"name\":\"John Doe\"}\nnot json at all\n").unwrap();

        let err = engine.process_file(&input, &output).await.unwrap_err();
        assert!(matches!(err, ShroudError::Serialization(_)));
        assert!(!err.is_fatal());
        // No partial output is left claiming to be complete
        assert!(!crate::core::verification::is_output_intact(&output));
    }

    #[test]
    fn test_mappings_registered_with_store() {
        let dir = TempDir::new().unwrap();
        let mut engine = test_engine(&dir, vec![CountryCode::In]);

        let (output, _) = engine.process_text("John Doe");
        assert_eq!(
            engine.store().get(PhiType::Name, "John Doe"),
            Some(output.as_str())
        );
    }
}
