//! Pattern library for PHI detection
//!
//! Detection rules live in embedded TOML tables under `patterns/`, one file
//! per jurisdiction plus a universal table. [`PatternLibrary::load`] merges
//! the universal table with the tables of every configured country, compiles
//! all regexes, and priority-sorts the result. Compilation failures are
//! configuration errors at load time, never per-match skips.

use crate::deid::models::{DetectionPattern, PhiType};
use crate::domain::{CountryCode, Result, ShroudError};
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

const UNIVERSAL_TABLE: &str = include_str!("../../../patterns/universal.toml");
const US_TABLE: &str = include_str!("../../../patterns/us.toml");
const GB_TABLE: &str = include_str!("../../../patterns/gb.toml");
const IN_TABLE: &str = include_str!("../../../patterns/in.toml");
const DE_TABLE: &str = include_str!("../../../patterns/de.toml");
const AU_TABLE: &str = include_str!("../../../patterns/au.toml");

/// Pattern definition as written in the TOML tables
#[derive(Debug, Clone, Deserialize)]
struct PatternDefinition {
    /// Regex source strings for this rule
    patterns: Vec<String>,
    /// Overlap-resolution priority; higher wins
    priority: i32,
    /// PHI category tag
    category: String,
    /// Rule description
    #[serde(default)]
    description: String,
}

/// One jurisdiction's TOML table
#[derive(Debug, Deserialize)]
struct PatternTable {
    patterns: HashMap<String, PatternDefinition>,
}

/// Immutable, priority-ordered set of detection rules for one run
pub struct PatternLibrary {
    patterns: Vec<DetectionPattern>,
    patterns_by_type: HashMap<PhiType, Vec<DetectionPattern>>,
}

impl PatternLibrary {
    /// Build the library for the configured countries.
    ///
    /// Universal rules are always included; each listed country contributes
    /// its table once (duplicates in the list are ignored). Rules are sorted
    /// by descending priority.
    ///
    /// # Errors
    ///
    /// Returns `ShroudError::Configuration` if any regex fails to compile or
    /// a table carries an unknown category tag.
    pub fn load(countries: &[CountryCode]) -> Result<Self> {
        let mut patterns = Vec::new();

        merge_table(UNIVERSAL_TABLE, None, &mut patterns)?;

        let mut seen = HashSet::new();
        for &country in countries {
            if seen.insert(country) {
                merge_table(table_for(country), Some(country), &mut patterns)?;
            }
        }

        patterns.sort_by(|a, b| b.priority.cmp(&a.priority));

        let mut patterns_by_type: HashMap<PhiType, Vec<DetectionPattern>> = HashMap::new();
        for pattern in &patterns {
            patterns_by_type
                .entry(pattern.phi_type)
                .or_default()
                .push(pattern.clone());
        }

        tracing::debug!(
            rules = patterns.len(),
            countries = ?countries,
            "Pattern library loaded"
        );

        Ok(Self {
            patterns,
            patterns_by_type,
        })
    }

    /// All rules, highest priority first.
    pub fn all_patterns(&self) -> &[DetectionPattern] {
        &self.patterns
    }

    /// Rules detecting a specific category, highest priority first.
    pub fn patterns_for(&self, phi_type: PhiType) -> &[DetectionPattern] {
        self.patterns_by_type
            .get(&phi_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of compiled rules.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the library holds no rules.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Embedded table for a jurisdiction.
fn table_for(country: CountryCode) -> &'static str {
    match country {
        CountryCode::Us => US_TABLE,
        CountryCode::Gb => GB_TABLE,
        CountryCode::In => IN_TABLE,
        CountryCode::De => DE_TABLE,
        CountryCode::Au => AU_TABLE,
    }
}

/// Parse one TOML table and append its compiled rules.
fn merge_table(
    content: &str,
    country: Option<CountryCode>,
    out: &mut Vec<DetectionPattern>,
) -> Result<()> {
    let table: PatternTable = toml::from_str(content).map_err(|e| {
        ShroudError::Configuration(format!("Failed to parse pattern table: {e}"))
    })?;

    for (name, def) in table.patterns {
        let phi_type = parse_category(&def.category).map_err(|e| {
            ShroudError::Configuration(format!("Invalid category in pattern '{name}': {e}"))
        })?;

        for pattern_str in &def.patterns {
            let regex = Regex::new(pattern_str).map_err(|e| {
                ShroudError::Configuration(format!(
                    "Invalid regex in pattern '{name}': {pattern_str}: {e}"
                ))
            })?;

            out.push(DetectionPattern {
                phi_type,
                regex,
                priority: def.priority,
                description: def.description.clone(),
                country,
            });
        }
    }

    Ok(())
}

/// Parse a category tag to the PhiType enum.
fn parse_category(s: &str) -> std::result::Result<PhiType, String> {
    match s.to_uppercase().as_str() {
        "NAME" => Ok(PhiType::Name),
        "NATIONAL_ID" | "SSN" => Ok(PhiType::NationalId),
        "MEDICAL_RECORD_NUMBER" | "MRN" => Ok(PhiType::MedicalRecordNumber),
        "HEALTH_PLAN_NUMBER" | "HEALTH_PLAN" => Ok(PhiType::HealthPlanNumber),
        "ACCOUNT_NUMBER" | "ACCOUNT" => Ok(PhiType::AccountNumber),
        "CERTIFICATE_LICENSE_NUMBER" | "LICENSE" => Ok(PhiType::CertificateLicenseNumber),
        "PHONE" => Ok(PhiType::Phone),
        "FAX" => Ok(PhiType::Fax),
        "EMAIL" => Ok(PhiType::Email),
        "STREET_ADDRESS" | "ADDRESS" => Ok(PhiType::StreetAddress),
        "CITY" => Ok(PhiType::City),
        "POSTAL_CODE" | "ZIP" => Ok(PhiType::PostalCode),
        "DATE" => Ok(PhiType::Date),
        "URL" => Ok(PhiType::Url),
        "IP_ADDRESS" => Ok(PhiType::IpAddress),
        "DEVICE_IDENTIFIER" | "DEVICE" => Ok(PhiType::DeviceIdentifier),
        "VEHICLE_IDENTIFIER" | "VEHICLE" => Ok(PhiType::VehicleIdentifier),
        "BIOMETRIC_IDENTIFIER" | "BIOMETRIC" => Ok(PhiType::BiometricIdentifier),
        "UNIQUE_IDENTIFIER" | "IDENTIFIER" => Ok(PhiType::UniqueIdentifier),
        "ORGANIZATION" => Ok(PhiType::Organization),
        "CUSTOM" => Ok(PhiType::Custom),
        _ => Err(format!("Unknown PHI category: {s}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_universal_only() {
        let library = PatternLibrary::load(&[]).unwrap();
        assert!(!library.is_empty());
        assert!(!library.patterns_for(PhiType::Email).is_empty());
        assert!(!library.patterns_for(PhiType::Date).is_empty());
    }

    #[test]
    fn test_load_all_countries() {
        let library = PatternLibrary::load(&CountryCode::ALL).unwrap();
        assert!(!library.patterns_for(PhiType::NationalId).is_empty());
    }

    #[test]
    fn test_duplicate_countries_merge_once() {
        let once = PatternLibrary::load(&[CountryCode::Us]).unwrap();
        let twice = PatternLibrary::load(&[CountryCode::Us, CountryCode::Us]).unwrap();
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn test_priority_sorted_descending() {
        let library = PatternLibrary::load(&[CountryCode::Us]).unwrap();
        let priorities: Vec<i32> = library.all_patterns().iter().map(|p| p.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn test_email_pattern_matches() {
        let library = PatternLibrary::load(&[]).unwrap();
        let pattern = &library.patterns_for(PhiType::Email)[0];
        assert!(pattern.regex.is_match("test@example.com"));
        assert!(!pattern.regex.is_match("not-an-email"));
    }

    #[test]
    fn test_us_ssn_pattern_matches() {
        let library = PatternLibrary::load(&[CountryCode::Us]).unwrap();
        let patterns = library.patterns_for(PhiType::NationalId);
        assert!(patterns.iter().any(|p| p.regex.is_match("123-45-6789")));
    }

    #[test]
    fn test_in_aadhaar_pattern_matches() {
        let library = PatternLibrary::load(&[CountryCode::In]).unwrap();
        let patterns = library.patterns_for(PhiType::NationalId);
        assert!(patterns.iter().any(|p| p.regex.is_match("1234 5678 9012")));
    }

    #[test]
    fn test_invalid_regex_is_configuration_error() {
        let mut out = Vec::new();
        let table = r#"
[patterns.broken]
patterns = ['([unclosed']
priority = 10
category = "EMAIL"
"#;
        let err = merge_table(table, None, &mut out).unwrap_err();
        assert!(matches!(err, ShroudError::Configuration(_)));
    }

    #[test]
    fn test_unknown_category_is_configuration_error() {
        let mut out = Vec::new();
        let table = r#"
[patterns.bogus]
patterns = ['\d+']
priority = 10
category = "NOT_A_CATEGORY"
"#;
        let err = merge_table(table, None, &mut out).unwrap_err();
        assert!(matches!(err, ShroudError::Configuration(_)));
    }

    #[test]
    fn test_country_tagged_on_rules() {
        let library = PatternLibrary::load(&[CountryCode::Gb]).unwrap();
        assert!(library
            .all_patterns()
            .iter()
            .any(|p| p.country == Some(CountryCode::Gb)));
        assert!(library.all_patterns().iter().any(|p| p.country.is_none()));
    }
}
