//! Domain error types
//!
//! This module defines the error hierarchy for Shroud. All errors are
//! domain-specific and don't expose third-party types.
//!
//! Fatal classes (`Configuration`, `Crypto`) abort a run before or during
//! startup; recoverable classes are aggregated at file granularity by the
//! batch driver.

use thiserror::Error;

/// Main Shroud error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum ShroudError {
    /// Configuration-related errors: invalid regex in a pattern table,
    /// unknown country code, missing key material with encryption enabled.
    /// Fatal - aborts before any processing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Mapping store encryption/decryption failures: wrong key, corrupted
    /// or tampered blob. Fatal - the run must not continue with an empty
    /// table and generate inconsistent pseudonyms.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for ShroudError {
    fn from(err: std::io::Error) -> Self {
        ShroudError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ShroudError {
    fn from(err: serde_json::Error) -> Self {
        ShroudError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ShroudError {
    fn from(err: toml::de::Error) -> Self {
        ShroudError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl ShroudError {
    /// Whether this error class must abort the whole run rather than be
    /// isolated at file granularity.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Crypto(_))
    }
}
