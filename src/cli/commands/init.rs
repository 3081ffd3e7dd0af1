//! Init command implementation
//!
//! Writes a commented starter configuration file.

use clap::Args;
use std::path::PathBuf;

const STARTER_CONFIG: &str = r#"# Shroud configuration

[application]
log_level = "info"

[deidentification]
# Ordered jurisdictions; the first decides date-format preference for
# ambiguous dates, all contribute detection patterns.
countries = ["us"]
# Seed for the deterministic date-shift offset and pseudonym salt.
seed = "${SHROUD_SEED}"
date_shift_range_days = 365
# Provenance fields copied through verbatim.
passthrough_fields = ["source_file"]

[mapping]
path = "./state/mappings.shroud"
# Disabling encryption stores original-to-pseudonym associations in the
# clear and is logged loudly.
encryption_enabled = true
key = "${SHROUD_MAPPING_KEY}"
checkpoint_every = 25

[audit]
enabled = true
artifact_name = "deid_audit.json"

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the configuration file
    #[arg(long, default_value = "shroud.toml")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        if self.path.exists() && !self.force {
            eprintln!(
                "{} already exists; use --force to overwrite",
                self.path.display()
            );
            return Ok(1);
        }

        tokio::fs::write(&self.path, STARTER_CONFIG).await?;
        println!("Wrote starter configuration to {}", self.path.display());
        println!("Set SHROUD_SEED and SHROUD_MAPPING_KEY before running.");
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_writes_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("shroud.toml");

        let args = InitArgs {
            path: path.clone(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(path.exists());

        // Refuses to clobber without --force
        assert_eq!(args.execute().await.unwrap(), 1);
    }
}
