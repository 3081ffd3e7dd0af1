//! Run command implementation
//!
//! De-identifies every record file under the input root into a mirrored
//! layout under the output root, then optionally re-scans the output for
//! residual PHI-shaped content.

use crate::config::load_config;
use crate::core::batch::DatasetDriver;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input dataset root
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output root; directory layout is mirrored file-for-file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Override enabled countries (comma-separated, first decides date order)
    #[arg(long)]
    pub countries: Option<String>,

    /// Re-scan the output for residual PHI after processing
    #[arg(long)]
    pub validate: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting de-identification run");

        let mut config = load_config(config_path)?;

        if let Some(countries) = &self.countries {
            let mut parsed = Vec::new();
            for part in countries.split(',') {
                parsed.push(part.trim().parse()?);
            }
            tracing::info!(countries = ?parsed, "Overriding countries from CLI");
            config.deidentification.countries = parsed;
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;
        }

        let mut driver = DatasetDriver::new(&config)?;
        let summary = driver.run(&self.input, &self.output).await?;

        println!("De-identification run {} complete", summary.run_id);
        println!("  Files processed: {}", summary.files_processed);
        println!("  Files skipped:   {}", summary.files_skipped);
        println!("  Files failed:    {}", summary.files_failed);
        println!("  Detections:      {}", summary.total_detections());

        let mut by_type: Vec<_> = summary.detections_by_type.iter().collect();
        by_type.sort_by_key(|(t, _)| t.token_prefix());
        for (phi_type, count) in by_type {
            println!("    {:<10} {}", phi_type.token_prefix(), count);
        }

        for failure in &summary.failures {
            println!("  FAILED {}: {}", failure.file, failure.reason);
        }

        if self.validate {
            let findings = driver.validate(&self.output)?;
            if findings.is_empty() {
                println!("Residual scan: clean");
            } else {
                println!("Residual scan: {} finding(s)", findings.len());
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
                return Ok(4);
            }
        }

        Ok(if summary.files_failed > 0 { 1 } else { 0 })
    }
}
