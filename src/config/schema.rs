//! Configuration schema types
//!
//! This module defines the configuration structure for Shroud. One
//! [`ShroudConfig`] is constructed per invocation and is immutable once
//! loaded and validated.

use crate::config::SecretString;
use crate::domain::CountryCode;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main Shroud configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShroudConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// De-identification engine settings
    pub deidentification: DeidentificationConfig,

    /// Mapping store settings
    pub mapping: MappingConfig,

    /// Audit artifact settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ShroudConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.deidentification.validate()?;
        self.mapping.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// De-identification engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeidentificationConfig {
    /// Enabled jurisdictions, ordered. The first entry decides date-format
    /// preference for ambiguous dates; all entries contribute detection
    /// patterns.
    pub countries: Vec<CountryCode>,

    /// Seed for the deterministic date-shift offset and pseudonym salt.
    /// Secret: knowing the seed permits dictionary attacks on pseudonyms.
    pub seed: SecretString,

    /// Half-width of the uniform date-shift window, in days
    #[serde(default = "default_date_shift_range_days")]
    pub date_shift_range_days: i64,

    /// Field names copied through verbatim (provenance fields)
    #[serde(default = "default_passthrough_fields")]
    pub passthrough_fields: Vec<String>,
}

fn default_date_shift_range_days() -> i64 {
    365
}

fn default_passthrough_fields() -> Vec<String> {
    vec!["source_file".to_string()]
}

impl DeidentificationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.countries.is_empty() {
            return Err("deidentification.countries must list at least one country".to_string());
        }
        if self.seed.expose_secret().is_empty() {
            return Err("deidentification.seed must not be empty".to_string());
        }
        if self.date_shift_range_days < 1 {
            return Err(format!(
                "deidentification.date_shift_range_days must be >= 1, got {}",
                self.date_shift_range_days
            ));
        }
        Ok(())
    }

    /// Primary country: first of the ordered set, decides date preference.
    pub fn primary_country(&self) -> CountryCode {
        self.countries[0]
    }
}

/// Mapping store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Location of the encrypted mapping-table blob
    #[serde(default = "default_mapping_path")]
    pub path: PathBuf,

    /// Encrypt the mapping table at rest. Disabling this is a
    /// security-relevant override and is logged loudly.
    #[serde(default = "default_encryption_enabled")]
    pub encryption_enabled: bool,

    /// Key material for the store cipher. Required when encryption is
    /// enabled; ignored otherwise.
    #[serde(default)]
    pub key: Option<SecretString>,

    /// Persist the store every N successfully processed files
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,
}

fn default_mapping_path() -> PathBuf {
    PathBuf::from("./state/mappings.shroud")
}

fn default_encryption_enabled() -> bool {
    true
}

fn default_checkpoint_every() -> usize {
    25
}

impl MappingConfig {
    fn validate(&self) -> Result<(), String> {
        // Fail closed: encryption on with no key must never start a run.
        if self.encryption_enabled {
            match &self.key {
                Some(key) if !key.expose_secret().is_empty() => {}
                _ => {
                    return Err(
                        "mapping.key is required when mapping.encryption_enabled = true \
                         (set it in the TOML or via SHROUD_MAPPING_KEY)"
                            .to_string(),
                    )
                }
            }
        }
        if self.checkpoint_every == 0 {
            return Err("mapping.checkpoint_every must be >= 1".to_string());
        }
        Ok(())
    }
}

/// Audit artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Write the per-run audit artifact
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,

    /// File name of the audit artifact, created under the output root
    #[serde(default = "default_audit_artifact_name")]
    pub artifact_name: String,
}

fn default_audit_enabled() -> bool {
    true
}

fn default_audit_artifact_name() -> String {
    "deid_audit.json".to_string()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            artifact_name: default_audit_artifact_name(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable rolling file logs in addition to console output
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for rolling log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation cadence: "daily" or "hourly"
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

fn default_log_path() -> String {
    "./logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path must not be empty when file logging is enabled"
                .to_string());
        }
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn minimal_config() -> ShroudConfig {
        ShroudConfig {
            application: ApplicationConfig::default(),
            deidentification: DeidentificationConfig {
                countries: vec![CountryCode::In],
                seed: secret_string("test-seed".to_string()),
                date_shift_range_days: 365,
                passthrough_fields: default_passthrough_fields(),
            },
            mapping: MappingConfig {
                path: PathBuf::from("/tmp/mappings.shroud"),
                encryption_enabled: true,
                key: Some(secret_string("test-key".to_string())),
                checkpoint_every: 25,
            },
            audit: AuditConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(minimal_config().validate().is_ok());
    }

    #[test]
    fn test_missing_key_fails_closed() {
        let mut config = minimal_config();
        config.mapping.key = None;
        let err = config.validate().unwrap_err();
        assert!(err.contains("mapping.key"));
    }

    #[test]
    fn test_encryption_opt_out_without_key_is_valid() {
        let mut config = minimal_config();
        config.mapping.encryption_enabled = false;
        config.mapping.key = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_countries_rejected() {
        let mut config = minimal_config();
        config.deidentification.countries.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_shift_range_rejected() {
        let mut config = minimal_config();
        config.deidentification.date_shift_range_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = minimal_config();
        config.application.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_primary_country_is_first() {
        let mut config = minimal_config();
        config.deidentification.countries = vec![CountryCode::Gb, CountryCode::Us];
        assert_eq!(
            config.deidentification.primary_country(),
            CountryCode::Gb
        );
    }
}
