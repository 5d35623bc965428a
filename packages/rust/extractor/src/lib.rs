//! Renewal-date extraction from contract text.
//!
//! Scans free text for a renewal or expiry phrase followed by a date. Patterns
//! are tried in a fixed order and the first one that yields a parseable date
//! wins; there is no search for a "best" or "latest" date.
//!
//! Precedence:
//! 1. `renewal date: <Month DD, YYYY>`
//! 2. `expires on: <Month DD, YYYY>`
//! 3. `renewal date: <YYYY-MM-DD>`
//! 4. `expires on: <YYYY-MM-DD>`

mod patterns;

use chrono::NaiveDate;
use tracing::trace;

pub use patterns::{Phrase, parse_date};

/// A date found in document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// The parsed renewal date.
    pub date: NaiveDate,
    /// Phrase that introduced the date.
    pub phrase: Phrase,
    /// Raw date text as it appeared in the document.
    pub matched: String,
}

/// Find the renewal date in `text`, with details on what matched.
///
/// Only the first occurrence of each pattern is considered. If that
/// occurrence does not parse as a real date, the next pattern is tried.
pub fn extract(text: &str) -> Option<Extraction> {
    for (phrase, re) in patterns::ordered_patterns() {
        let Some(caps) = re.captures(text) else {
            continue;
        };
        let raw = &caps[1];
        match parse_date(raw) {
            Some(date) => {
                return Some(Extraction {
                    date,
                    phrase,
                    matched: raw.to_string(),
                });
            }
            None => {
                trace!(%phrase, raw, "phrase matched but date did not parse");
            }
        }
    }
    None
}

/// Find the renewal date in `text`.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    extract(text).map(|e| e.date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn iso_and_long_forms_agree() {
        assert_eq!(
            extract_date("Renewal date: 2025-03-01"),
            Some(date(2025, 3, 1))
        );
        assert_eq!(
            extract_date("renewal date: March 1, 2025"),
            Some(date(2025, 3, 1))
        );
    }

    #[test]
    fn renewal_phrase_beats_expires_phrase() {
        let text = "This agreement expires on: January 10, 2026.\n\
                    Renewal Date: December 1, 2025";
        let found = extract(text).unwrap();
        assert_eq!(found.phrase, Phrase::RenewalDate);
        assert_eq!(found.date, date(2025, 12, 1));
    }

    #[test]
    fn long_form_beats_iso_form() {
        // Pattern 2 (expires, long) outranks pattern 3 (renewal, ISO).
        let text = "Renewal date: 2025-09-01. Expires on: October 2, 2025.";
        let found = extract(text).unwrap();
        assert_eq!(found.phrase, Phrase::ExpiresOn);
        assert_eq!(found.date, date(2025, 10, 2));
        assert_eq!(found.matched, "October 2, 2025");
    }

    #[test]
    fn expires_on_long_form() {
        let text = "Term\n\nThe lease Expires on: June 5, 2025 unless renewed.";
        assert_eq!(extract_date(text), Some(date(2025, 6, 5)));
    }

    #[test]
    fn unparseable_match_falls_through_to_next_pattern() {
        let text = "Renewal date: Someday 12, 2025\nExpires on: 2025-11-30";
        let found = extract(text).unwrap();
        assert_eq!(found.phrase, Phrase::ExpiresOn);
        assert_eq!(found.date, date(2025, 11, 30));
    }

    #[test]
    fn abbreviated_month_falls_through_to_next_pattern() {
        let found = extract("Renewal date: Jun 5, 2025\nExpires on: July 1, 2025").unwrap();
        assert_eq!(found.date, date(2025, 7, 1));
        assert_eq!(found.phrase, Phrase::ExpiresOn);
        assert_eq!(found.matched, "July 1, 2025");
    }

    #[test]
    fn only_first_occurrence_of_a_pattern_counts() {
        // The first ISO renewal match is invalid; a later valid one is not
        // searched for, and no other pattern matches.
        let text = "renewal date: 2025-02-30\nrenewal date: 2025-03-01";
        assert_eq!(extract_date(text), None);
    }

    #[test]
    fn no_phrase_no_date() {
        assert_eq!(extract_date("Signed on 2025-01-01 by both parties."), None);
        assert_eq!(extract_date(""), None);
    }

    #[test]
    fn case_insensitive_phrase_and_month() {
        assert_eq!(
            extract_date("RENEWAL DATE: JULY 4, 2027"),
            Some(date(2027, 7, 4))
        );
    }
}
