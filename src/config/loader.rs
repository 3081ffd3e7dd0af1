//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::ShroudConfig;
use crate::config::secret_string;
use crate::domain::errors::ShroudError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into ShroudConfig
/// 4. Applies environment variable overrides (`SHROUD_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use shroud::config::load_config;
///
/// let config = load_config("shroud.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ShroudConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ShroudError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ShroudError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    // Perform environment variable substitution
    let contents = substitute_env_vars(&contents)?;

    // Parse TOML
    let mut config: ShroudConfig = toml::from_str(&contents)
        .map_err(|e| ShroudError::Configuration(format!("Failed to parse TOML: {e}")))?;

    // Apply environment variable overrides
    apply_env_overrides(&mut config)?;

    // Validate configuration
    config
        .validate()
        .map_err(|e| ShroudError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    // Process line by line to skip comments
    for line in input.lines() {
        let trimmed = line.trim_start();

        // Skip comment lines - don't process env vars in comments
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ShroudError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the `SHROUD_*` prefix
///
/// Environment variables follow the pattern: `SHROUD_<SECTION>_<KEY>`,
/// for example `SHROUD_MAPPING_KEY` or `SHROUD_DEIDENTIFICATION_COUNTRIES`.
fn apply_env_overrides(config: &mut ShroudConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("SHROUD_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // De-identification overrides
    if let Ok(val) = std::env::var("SHROUD_DEIDENTIFICATION_COUNTRIES") {
        let mut countries = Vec::new();
        for part in val.split(',') {
            countries.push(part.trim().parse()?);
        }
        config.deidentification.countries = countries;
    }
    if let Ok(val) = std::env::var("SHROUD_DEIDENTIFICATION_SEED") {
        config.deidentification.seed = secret_string(val);
    }
    if let Ok(val) = std::env::var("SHROUD_DEIDENTIFICATION_DATE_SHIFT_RANGE_DAYS") {
        if let Ok(days) = val.parse() {
            config.deidentification.date_shift_range_days = days;
        }
    }

    // Mapping store overrides
    if let Ok(val) = std::env::var("SHROUD_MAPPING_PATH") {
        config.mapping.path = val.into();
    }
    if let Ok(val) = std::env::var("SHROUD_MAPPING_ENCRYPTION_ENABLED") {
        config.mapping.encryption_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("SHROUD_MAPPING_KEY") {
        config.mapping.key = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("SHROUD_MAPPING_CHECKPOINT_EVERY") {
        if let Ok(every) = val.parse() {
            config.mapping.checkpoint_every = every;
        }
    }

    // Audit overrides
    if let Ok(val) = std::env::var("SHROUD_AUDIT_ENABLED") {
        config.audit.enabled = val.parse().unwrap_or(true);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("SHROUD_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("SHROUD_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_TOML: &str = r#"
[application]
log_level = "info"

[deidentification]
countries = ["in", "us"]
seed = "fixture-seed"
date_shift_range_days = 365

[mapping]
path = "/tmp/mappings.shroud"
encryption_enabled = true
key = "fixture-key"
"#;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("SHROUD_TEST_VAR", "test_value");
        let input = "key = \"${SHROUD_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "key = \"test_value\"\n");
        std::env::remove_var("SHROUD_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("SHROUD_MISSING_VAR");
        let input = "key = \"${SHROUD_MISSING_VAR}\"";
        let result = substitute_env_vars(input);
        assert!(result.is_err());
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("SHROUD_COMMENTED_VAR");
        let input = "# key = \"${SHROUD_COMMENTED_VAR}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(VALID_TOML.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.deidentification.countries.len(), 2);
        assert_eq!(config.application.log_level, "info");
        assert!(config.mapping.encryption_enabled);
    }

    #[test]
    fn test_load_config_rejects_unknown_country() {
        let toml = VALID_TOML.replace("\"in\", \"us\"", "\"zz\"");
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        assert!(load_config(temp_file.path()).is_err());
    }
}
