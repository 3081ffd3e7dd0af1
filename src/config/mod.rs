//! Configuration management for Shroud.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! Shroud uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SHROUD_*` environment variable overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [deidentification]
//! countries = ["in"]
//! seed = "${SHROUD_SEED}"
//! date_shift_range_days = 365
//!
//! [mapping]
//! path = "./state/mappings.shroud"
//! encryption_enabled = true
//! key = "${SHROUD_MAPPING_KEY}"
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use shroud::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("shroud.toml")?;
//! println!("Countries: {:?}", config.deidentification.countries);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, AuditConfig, DeidentificationConfig, LoggingConfig, MappingConfig,
    ShroudConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
