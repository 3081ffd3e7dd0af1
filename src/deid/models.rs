//! Core data models for PHI detection and replacement

use crate::domain::CountryCode;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// PHI category enumeration
///
/// Closed set of identifier categories, informed by the HIPAA Safe Harbor
/// list plus jurisdiction-specific national identifiers. Defined at compile
/// time; pattern tables reference these by tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhiType {
    /// Personal names (first, middle, last)
    Name,
    /// National identity numbers (SSN, Aadhaar, NI number, tax IDs)
    NationalId,
    /// Medical record numbers (MRN, NHS number)
    MedicalRecordNumber,
    /// Health plan beneficiary numbers
    HealthPlanNumber,
    /// Account numbers
    AccountNumber,
    /// Certificate or license numbers
    CertificateLicenseNumber,
    /// Telephone numbers
    Phone,
    /// Fax numbers
    Fax,
    /// Email addresses
    Email,
    /// Street-level address components
    StreetAddress,
    /// City names
    City,
    /// Postal/ZIP/PIN codes
    PostalCode,
    /// Calendar dates (routed to the date shifter, not pseudonymized)
    Date,
    /// Web URLs
    Url,
    /// IP addresses
    IpAddress,
    /// Device identifiers and serial numbers
    DeviceIdentifier,
    /// Vehicle identifiers (plates, VINs)
    VehicleIdentifier,
    /// Biometric identifiers
    BiometricIdentifier,
    /// Any other unique identifying number or code
    UniqueIdentifier,
    /// Organization names that identify an individual's affiliation
    Organization,
    /// Site-defined custom category
    Custom,
}

impl PhiType {
    /// Pseudonym template tag: `PATIENT-{id}`, `MRN-{id}`, ...
    pub fn token_prefix(&self) -> &'static str {
        match self {
            Self::Name => "PATIENT",
            Self::NationalId => "ID",
            Self::MedicalRecordNumber => "MRN",
            Self::HealthPlanNumber => "PLAN",
            Self::AccountNumber => "ACCT",
            Self::CertificateLicenseNumber => "LIC",
            Self::Phone => "PHONE",
            Self::Fax => "FAX",
            Self::Email => "EMAIL",
            Self::StreetAddress => "ADDR",
            Self::City => "CITY",
            Self::PostalCode => "POSTAL",
            Self::Date => "DATE",
            Self::Url => "URL",
            Self::IpAddress => "IP",
            Self::DeviceIdentifier => "DEVICE",
            Self::VehicleIdentifier => "VEHICLE",
            Self::BiometricIdentifier => "BIO",
            Self::UniqueIdentifier => "UID",
            Self::Organization => "ORG",
            Self::Custom => "CUSTOM",
        }
    }
}

/// A compiled detection rule
///
/// Invalid regexes are a configuration error at library load, never a
/// per-match skip.
#[derive(Debug, Clone)]
pub struct DetectionPattern {
    /// Category this pattern detects
    pub phi_type: PhiType,
    /// Compiled regex
    pub regex: Regex,
    /// Total order for overlap conflict resolution; higher wins
    pub priority: i32,
    /// Human-readable rule description
    pub description: String,
    /// Jurisdiction that contributed this rule; None for universal rules
    pub country: Option<CountryCode>,
}

/// A single accepted match within one text field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// Detected category
    pub phi_type: PhiType,
    /// Byte offset of the match start in the original text
    pub start: usize,
    /// Byte offset of the match end in the original text
    pub end: usize,
}

/// A residual PHI-shaped string found in already-de-identified output
///
/// Carries location and category only - never the matched text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidualFinding {
    /// Output file the finding was located in
    pub file: String,
    /// 1-based line number
    pub line: usize,
    /// Detected category
    pub phi_type: PhiType,
    /// Byte span within the line
    pub start: usize,
    /// Byte span within the line
    pub end: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_prefixes_are_unique() {
        let all = [
            PhiType::Name,
            PhiType::NationalId,
            PhiType::MedicalRecordNumber,
            PhiType::HealthPlanNumber,
            PhiType::AccountNumber,
            PhiType::CertificateLicenseNumber,
            PhiType::Phone,
            PhiType::Fax,
            PhiType::Email,
            PhiType::StreetAddress,
            PhiType::City,
            PhiType::PostalCode,
            PhiType::Date,
            PhiType::Url,
            PhiType::IpAddress,
            PhiType::DeviceIdentifier,
            PhiType::VehicleIdentifier,
            PhiType::BiometricIdentifier,
            PhiType::UniqueIdentifier,
            PhiType::Organization,
            PhiType::Custom,
        ];
        let mut prefixes: Vec<_> = all.iter().map(|t| t.token_prefix()).collect();
        prefixes.sort_unstable();
        prefixes.dedup();
        assert_eq!(prefixes.len(), all.len());
    }

    #[test]
    fn test_phi_type_serde_tag() {
        let json = serde_json::to_string(&PhiType::MedicalRecordNumber).unwrap();
        assert_eq!(json, "\"MEDICAL_RECORD_NUMBER\"");
    }

    #[test]
    fn test_residual_finding_serializes_without_text() {
        let finding = ResidualFinding {
            file: "out/a.jsonl".to_string(),
            line: 3,
            phi_type: PhiType::Email,
            start: 10,
            end: 25,
        };
        let json = serde_json::to_string(&finding).unwrap();
        assert!(json.contains("EMAIL"));
        assert!(!json.contains("value"));
    }
}
