//! Validate command implementation
//!
//! Re-scans already-de-identified output with the configured pattern
//! library and reports residual PHI-shaped content. Findings never include
//! the matched text.

use crate::config::load_config;
use crate::core::verification::scan_dataset;
use crate::deid::patterns::PatternLibrary;
use clap::Args;
use std::collections::HashMap;
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// De-identified output root to scan
    #[arg(short, long)]
    pub output: PathBuf,
}

impl ValidateArgs {
    /// Execute the validate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = load_config(config_path)?;
        let library = PatternLibrary::load(&config.deidentification.countries)?;

        let findings = scan_dataset(&library, &self.output)?;

        if findings.is_empty() {
            println!("Residual scan: clean ({})", self.output.display());
            return Ok(0);
        }

        let mut by_type: HashMap<&str, usize> = HashMap::new();
        for finding in &findings {
            *by_type.entry(finding.phi_type.token_prefix()).or_insert(0) += 1;
        }

        println!("Residual scan: {} finding(s)", findings.len());
        let mut counts: Vec<_> = by_type.into_iter().collect();
        counts.sort();
        for (tag, count) in counts {
            println!("  {tag:<10} {count}");
        }
        for finding in &findings {
            println!(
                "  {}:{} {} [{}..{}]",
                finding.file,
                finding.line,
                finding.phi_type.token_prefix(),
                finding.start,
                finding.end
            );
        }

        Ok(4)
    }
}
