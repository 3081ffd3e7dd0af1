//! Validate-config command implementation

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateConfigArgs {}

impl ValidateConfigArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        match load_config(config_path) {
            Ok(config) => {
                println!("Configuration valid: {config_path}");
                println!(
                    "  Countries:  {}",
                    config
                        .deidentification
                        .countries
                        .iter()
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                println!(
                    "  Encryption: {}",
                    if config.mapping.encryption_enabled {
                        "enabled"
                    } else {
                        "DISABLED"
                    }
                );
                println!("  Store path: {}", config.mapping.path.display());
                Ok(0)
            }
            Err(e) => {
                eprintln!("Configuration invalid: {e}");
                Ok(2)
            }
        }
    }
}
