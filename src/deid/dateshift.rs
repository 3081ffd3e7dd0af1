//! Country-aware date parsing and consistent shifting
//!
//! One [`DateShifter`] instance carries one deterministic day-offset, seeded
//! from configuration, and applies it to every date it processes. All dates
//! shifted by one instance move by the same amount, so relative intervals
//! between any two dates are preserved.
//!
//! Parsing resolves format ambiguity in two steps: candidate formats are
//! ranked by the country's day/month-order preference (ISO 8601 always
//! first, the opposite family appended last), and a numeric plausibility
//! check rejects any candidate whose month position holds a value above 12
//! before the strict parse runs. Unambiguous dates therefore parse correctly
//! regardless of the country setting; truly ambiguous dates follow the
//! country preference deterministically.

use crate::domain::{CountryCode, DateOrder};
use chrono::{Duration, NaiveDate};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Which calendar field the leading numeric token binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenOrder {
    /// Year-first, unambiguous
    Iso,
    /// Day in the first token, month in the second
    DayFirst,
    /// Month in the first token, day in the second
    MonthFirst,
}

/// A parse/render candidate
#[derive(Debug, Clone, Copy)]
struct CandidateFormat {
    pattern: &'static str,
    order: TokenOrder,
}

const DAY_FIRST_CANDIDATES: [CandidateFormat; 6] = [
    CandidateFormat { pattern: "%Y-%m-%d", order: TokenOrder::Iso },
    CandidateFormat { pattern: "%d/%m/%Y", order: TokenOrder::DayFirst },
    CandidateFormat { pattern: "%d-%m-%Y", order: TokenOrder::DayFirst },
    CandidateFormat { pattern: "%d.%m.%Y", order: TokenOrder::DayFirst },
    CandidateFormat { pattern: "%m/%d/%Y", order: TokenOrder::MonthFirst },
    CandidateFormat { pattern: "%m-%d-%Y", order: TokenOrder::MonthFirst },
];

const MONTH_FIRST_CANDIDATES: [CandidateFormat; 6] = [
    CandidateFormat { pattern: "%Y-%m-%d", order: TokenOrder::Iso },
    CandidateFormat { pattern: "%m/%d/%Y", order: TokenOrder::MonthFirst },
    CandidateFormat { pattern: "%m-%d-%Y", order: TokenOrder::MonthFirst },
    CandidateFormat { pattern: "%d/%m/%Y", order: TokenOrder::DayFirst },
    CandidateFormat { pattern: "%d-%m-%Y", order: TokenOrder::DayFirst },
    CandidateFormat { pattern: "%d.%m.%Y", order: TokenOrder::DayFirst },
];

/// Session-consistent date shifter
pub struct DateShifter {
    offset_days: i64,
    candidates: &'static [CandidateFormat],
    cache: HashMap<String, String>,
}

impl DateShifter {
    /// Create a shifter for `country` with a deterministic offset derived
    /// from `seed`, uniform in `[-range_days, +range_days]`.
    pub fn new(country: CountryCode, seed: &[u8], range_days: i64) -> Self {
        let offset_days = derive_offset(seed, range_days);
        let candidates = match country.date_order() {
            DateOrder::DayFirst => &DAY_FIRST_CANDIDATES[..],
            DateOrder::MonthFirst => &MONTH_FIRST_CANDIDATES[..],
        };

        tracing::debug!(offset_days, country = %country, "Date shifter initialized");

        Self {
            offset_days,
            candidates,
            cache: HashMap::new(),
        }
    }

    /// The instance offset, fixed for the shifter's lifetime.
    pub fn offset_days(&self) -> i64 {
        self.offset_days
    }

    /// Shift a date string, preserving its format.
    ///
    /// Returns an opaque `[DATE-xxxxxxxx]` placeholder if no candidate
    /// format parses; never fails.
    pub fn shift(&mut self, input: &str) -> String {
        if let Some(hit) = self.cache.get(input) {
            return hit.clone();
        }

        let trimmed = input.trim();
        for candidate in self.candidates {
            if !month_token_plausible(trimmed, candidate.order) {
                continue;
            }
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, candidate.pattern) {
                let shifted = date + Duration::days(self.offset_days);
                let rendered = shifted.format(candidate.pattern).to_string();
                self.cache.insert(input.to_string(), rendered.clone());
                return rendered;
            }
        }

        let placeholder = placeholder_for(input);
        tracing::warn!(
            placeholder = %placeholder,
            "Date string did not match any configured format; substituting placeholder"
        );
        self.cache.insert(input.to_string(), placeholder.clone());
        placeholder
    }
}

/// Offset in `[-range, +range]` from the leading digest bytes of the seed.
fn derive_offset(seed: &[u8], range_days: i64) -> i64 {
    let digest = Sha256::digest(seed);
    let n = i64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]));
    n % (2 * range_days + 1) - range_days
}

/// Reject a candidate when the token in its month position cannot be a
/// month. This overrides country preference for numerically unambiguous
/// dates like `13/05/2020`.
fn month_token_plausible(input: &str, order: TokenOrder) -> bool {
    if order == TokenOrder::Iso {
        return true;
    }

    let mut tokens = input
        .split(|c: char| !c.is_ascii_digit())
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<u32>().unwrap_or(u32::MAX));

    let (first, second) = match (tokens.next(), tokens.next()) {
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };

    let month = match order {
        TokenOrder::MonthFirst => first,
        TokenOrder::DayFirst => second,
        TokenOrder::Iso => unreachable!(),
    };
    (1..=12).contains(&month)
}

/// Opaque placeholder derived from a hash of the input; carries no
/// recoverable date information.
fn placeholder_for(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    format!(
        "[DATE-{:02x}{:02x}{:02x}{:02x}]",
        digest[0], digest[1], digest[2], digest[3]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const SEED: &[u8] = b"dateshift-test-seed";

    #[test]
    fn test_offset_in_range_and_deterministic() {
        for seed in [b"a".as_slice(), b"b".as_slice(), b"longer seed material".as_slice()] {
            let s1 = DateShifter::new(CountryCode::In, seed, 365);
            let s2 = DateShifter::new(CountryCode::In, seed, 365);
            assert_eq!(s1.offset_days(), s2.offset_days());
            assert!(s1.offset_days() >= -365 && s1.offset_days() <= 365);
        }
    }

    #[test]
    fn test_iso_format_preserved() {
        let mut shifter = DateShifter::new(CountryCode::Us, SEED, 365);
        let offset = shifter.offset_days();
        let shifted = shifter.shift("2020-05-13");

        let expected = NaiveDate::from_ymd_opt(2020, 5, 13).unwrap() + Duration::days(offset);
        assert_eq!(shifted, expected.format("%Y-%m-%d").to_string());
    }

    #[test_case(CountryCode::In, "13/05/2020", "%d/%m/%Y" ; "day first slash")]
    #[test_case(CountryCode::In, "13-05-2020", "%d-%m-%Y" ; "day first dash")]
    #[test_case(CountryCode::De, "13.05.2020", "%d.%m.%Y" ; "day first dot")]
    fn test_day_first_format_preserved(country: CountryCode, input: &str, pattern: &str) {
        let mut shifter = DateShifter::new(country, SEED, 365);
        let offset = shifter.offset_days();
        let shifted = shifter.shift(input);

        let expected = NaiveDate::from_ymd_opt(2020, 5, 13).unwrap() + Duration::days(offset);
        assert_eq!(shifted, expected.format(pattern).to_string());
    }

    #[test]
    fn test_ambiguity_override_in_month_first_country() {
        // 13 cannot be a month, so a US shifter must fall through to DD/MM
        let mut shifter = DateShifter::new(CountryCode::Us, SEED, 365);
        let offset = shifter.offset_days();
        let shifted = shifter.shift("13/05/2020");

        let expected = NaiveDate::from_ymd_opt(2020, 5, 13).unwrap() + Duration::days(offset);
        assert_eq!(shifted, expected.format("%d/%m/%Y").to_string());
    }

    #[test]
    fn test_truly_ambiguous_follows_country_preference() {
        let mut us = DateShifter::new(CountryCode::Us, SEED, 365);
        let mut india = DateShifter::new(CountryCode::In, SEED, 365);
        let offset = us.offset_days();

        let us_expected = NaiveDate::from_ymd_opt(2014, 4, 9).unwrap() + Duration::days(offset);
        let in_expected = NaiveDate::from_ymd_opt(2014, 9, 4).unwrap() + Duration::days(offset);

        assert_eq!(
            us.shift("04/09/2014"),
            us_expected.format("%m/%d/%Y").to_string()
        );
        assert_eq!(
            india.shift("04/09/2014"),
            in_expected.format("%d/%m/%Y").to_string()
        );
    }

    #[test_case(CountryCode::Us ; "month first country")]
    #[test_case(CountryCode::In ; "day first country")]
    #[test_case(CountryCode::Gb ; "gb")]
    fn test_interval_preservation(country: CountryCode) {
        let mut shifter = DateShifter::new(country, SEED, 365);

        let d1 = shifter.shift("2020-01-10");
        let d2 = shifter.shift("2020-03-10");

        let p1 = NaiveDate::parse_from_str(&d1, "%Y-%m-%d").unwrap();
        let p2 = NaiveDate::parse_from_str(&d2, "%Y-%m-%d").unwrap();
        assert_eq!((p2 - p1).num_days(), 60);
    }

    #[test]
    fn test_same_offset_across_formats() {
        let mut shifter = DateShifter::new(CountryCode::In, SEED, 365);
        let offset = shifter.offset_days();

        let iso = shifter.shift("2021-06-15");
        let slashed = shifter.shift("15/06/2021");

        let expected = NaiveDate::from_ymd_opt(2021, 6, 15).unwrap() + Duration::days(offset);
        assert_eq!(iso, expected.format("%Y-%m-%d").to_string());
        assert_eq!(slashed, expected.format("%d/%m/%Y").to_string());
    }

    #[test]
    fn test_unparseable_yields_stable_placeholder() {
        let mut shifter = DateShifter::new(CountryCode::Us, SEED, 365);
        let p1 = shifter.shift("not a date");
        let p2 = shifter.shift("not a date");

        assert!(p1.starts_with("[DATE-"));
        assert!(p1.ends_with(']'));
        assert_eq!(p1, p2);
        // Distinct inputs get distinct placeholders
        assert_ne!(p1, shifter.shift("also not a date"));
    }

    #[test]
    fn test_impossible_calendar_date_is_placeholder() {
        let mut shifter = DateShifter::new(CountryCode::Us, SEED, 365);
        // Month and day positions are both impossible
        assert!(shifter.shift("45/45/2020").starts_with("[DATE-"));
    }

    #[test]
    fn test_cache_returns_identical_output() {
        let mut shifter = DateShifter::new(CountryCode::In, SEED, 365);
        let first = shifter.shift("01/02/2020");
        let second = shifter.shift("01/02/2020");
        assert_eq!(first, second);
    }

    #[test]
    fn test_range_one_day() {
        let shifter = DateShifter::new(CountryCode::Us, SEED, 1);
        assert!((-1..=1).contains(&shifter.offset_days()));
    }
}
