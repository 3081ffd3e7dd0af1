//! Audit command implementation
//!
//! Prints mapping store statistics and, on request, the full audit view.
//! Neither output ever contains an original value.

use crate::config::load_config;
use crate::store::MappingStore;
use clap::Args;

/// Arguments for the audit command
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Emit the audit view (pseudonym, type, timestamp) as JSON
    #[arg(long)]
    pub json: bool,
}

impl AuditArgs {
    /// Execute the audit command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = load_config(config_path)?;
        let store = MappingStore::open(&config.mapping)?;

        if self.json {
            let view = store.export_for_audit();
            println!("{}", serde_json::to_string_pretty(&view)?);
            return Ok(0);
        }

        println!("Mapping store: {}", config.mapping.path.display());
        println!("  Associations: {}", store.len());

        let stats = store.statistics();
        let mut counts: Vec<_> = stats.iter().collect();
        counts.sort_by_key(|(t, _)| t.token_prefix());
        for (phi_type, count) in counts {
            println!("  {:<10} {}", phi_type.token_prefix(), count);
        }

        Ok(0)
    }
}
