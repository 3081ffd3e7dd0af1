//! Residual PHI scan over de-identified output
//!
//! Re-applies the run's pattern library to already-written output files and
//! reports anything that still looks like PHI. This is an acceptance-gate
//! signal, not a compliance guarantee. Findings carry location and category
//! only - never the matched text.
//!
//! DATE matches are excluded: shifted dates are intentionally date-shaped.

use crate::core::batch::discover_jsonl_files;
use crate::deid::engine::resolve_matches;
use crate::deid::models::{PhiType, ResidualFinding};
use crate::deid::patterns::PatternLibrary;
use crate::domain::Result;
use std::fs;
use std::path::Path;

/// Scan every output file under `output_root` for residual PHI-shaped
/// strings.
///
/// Unreadable files are logged and skipped; the scan itself only fails if
/// the root cannot be walked.
pub fn scan_dataset(library: &PatternLibrary, output_root: &Path) -> Result<Vec<ResidualFinding>> {
    let files = discover_jsonl_files(output_root)?;
    let mut findings = Vec::new();

    for file in files {
        let content = match fs::read_to_string(&file) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "Skipping unreadable output file in residual scan");
                continue;
            }
        };

        let display_path = file
            .strip_prefix(output_root)
            .unwrap_or(&file)
            .display()
            .to_string();

        for (idx, line) in content.lines().enumerate() {
            for matched in resolve_matches(library, line) {
                if matched.phi_type == PhiType::Date {
                    continue;
                }
                findings.push(ResidualFinding {
                    file: display_path.clone(),
                    line: idx + 1,
                    phi_type: matched.phi_type,
                    start: matched.start,
                    end: matched.end,
                });
            }
        }
    }

    if !findings.is_empty() {
        tracing::warn!(
            findings = findings.len(),
            "Residual PHI-shaped content detected in output"
        );
    }

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_output_has_no_findings() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("clean.jsonl"),
            "{\"name\":\"PATIENT-AB23CD\",\"visit_date\":\"2020-01-01\"}\n",
        )
        .unwrap();

        let library = PatternLibrary::load(&[]).unwrap();
        let findings = scan_dataset(&library, dir.path()).unwrap();
        assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    }

    #[test]
    fn test_unmasked_email_is_reported_without_text() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("leaky.jsonl"),
            "{\"contact\":\"leaked@example.com\"}\n",
        )
        .unwrap();

        let library = PatternLibrary::load(&[]).unwrap();
        let findings = scan_dataset(&library, dir.path()).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].phi_type, PhiType::Email);
        assert_eq!(findings[0].line, 1);
        let json = serde_json::to_string(&findings).unwrap();
        assert!(!json.contains("leaked@example.com"));
    }

    #[test]
    fn test_shifted_dates_are_not_findings() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("dates.jsonl"),
            "{\"visit_date\":\"14/12/2013\"}\n",
        )
        .unwrap();

        let library = PatternLibrary::load(&[]).unwrap();
        let findings = scan_dataset(&library, dir.path()).unwrap();
        assert!(findings.is_empty());
    }
}
