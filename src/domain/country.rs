//! Country codes and jurisdiction-level static data
//!
//! Shroud's country registry is static tagged data: each supported
//! jurisdiction is one enum variant carrying its date-order preference,
//! plus a pattern table under `patterns/`. Adding a country means adding a
//! variant, a preference entry, and a TOML table - no new code paths.

use crate::domain::errors::ShroudError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Preferred ordering of day and month in ambiguous numeric dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    /// `DD/MM/YYYY` family (most of the world)
    DayFirst,
    /// `MM/DD/YYYY` family (United States)
    MonthFirst,
}

/// Supported jurisdiction, ISO 3166-1 alpha-2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CountryCode {
    /// United States
    Us,
    /// United Kingdom
    Gb,
    /// India
    In,
    /// Germany
    De,
    /// Australia
    Au,
}

impl CountryCode {
    /// All supported countries, in registry order.
    pub const ALL: [CountryCode; 5] = [
        CountryCode::Us,
        CountryCode::Gb,
        CountryCode::In,
        CountryCode::De,
        CountryCode::Au,
    ];

    /// Lowercase alpha-2 code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Us => "us",
            Self::Gb => "gb",
            Self::In => "in",
            Self::De => "de",
            Self::Au => "au",
        }
    }

    /// Date-order preference used to rank ambiguous numeric date formats.
    pub fn date_order(&self) -> DateOrder {
        match self {
            Self::Us => DateOrder::MonthFirst,
            Self::Gb | Self::In | Self::De | Self::Au => DateOrder::DayFirst,
        }
    }
}

impl FromStr for CountryCode {
    type Err = ShroudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "us" | "usa" => Ok(Self::Us),
            "gb" | "uk" => Ok(Self::Gb),
            "in" => Ok(Self::In),
            "de" => Ok(Self::De),
            "au" => Ok(Self::Au),
            other => Err(ShroudError::Configuration(format!(
                "Unsupported country code: '{other}'. Supported: us, gb, in, de, au"
            ))),
        }
    }
}

impl TryFrom<String> for CountryCode {
    type Error = ShroudError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CountryCode> for String {
    fn from(c: CountryCode) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_country_codes() {
        assert_eq!("US".parse::<CountryCode>().unwrap(), CountryCode::Us);
        assert_eq!("uk".parse::<CountryCode>().unwrap(), CountryCode::Gb);
        assert_eq!("in".parse::<CountryCode>().unwrap(), CountryCode::In);
        assert!(" de ".parse::<CountryCode>().is_ok());
    }

    #[test]
    fn test_unknown_country_is_configuration_error() {
        let err = "zz".parse::<CountryCode>().unwrap_err();
        assert!(matches!(err, ShroudError::Configuration(_)));
    }

    #[test]
    fn test_date_order_preference() {
        assert_eq!(CountryCode::Us.date_order(), DateOrder::MonthFirst);
        assert_eq!(CountryCode::In.date_order(), DateOrder::DayFirst);
        assert_eq!(CountryCode::De.date_order(), DateOrder::DayFirst);
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&CountryCode::In).unwrap();
        assert_eq!(json, "\"in\"");
        let back: CountryCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CountryCode::In);
    }
}
