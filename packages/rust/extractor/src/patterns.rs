//! Renewal-date phrase patterns and date parsing.
//!
//! Two phrases are recognized ("renewal date" and "expires on"), each followed
//! by any run of `:` and whitespace and then a date in one of two shapes:
//! - `Month DD, YYYY` (full English month name, 1–2 digit day)
//! - `YYYY-MM-DD`

use std::sync::LazyLock;

use chrono::{Datelike, Month, NaiveDate};
use regex::Regex;

/// Which phrase introduced the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrase {
    /// `renewal date: ...`
    RenewalDate,
    /// `expires on: ...`
    ExpiresOn,
}

impl std::fmt::Display for Phrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RenewalDate => write!(f, "renewal date"),
            Self::ExpiresOn => write!(f, "expires on"),
        }
    }
}

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// Matches `renewal date: March 1, 2025`.
static RENEWAL_LONG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)renewal date[:\s]*([A-Za-z]+ \d{1,2}, \d{4})").expect("renewal long regex")
});

/// Matches `expires on: March 1, 2025`.
static EXPIRES_LONG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)expires on[:\s]*([A-Za-z]+ \d{1,2}, \d{4})").expect("expires long regex")
});

/// Matches `renewal date: 2025-03-01`.
static RENEWAL_ISO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)renewal date[:\s]*(\d{4}-\d{2}-\d{2})").expect("renewal iso regex")
});

/// Matches `expires on: 2025-03-01`.
static EXPIRES_ISO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)expires on[:\s]*(\d{4}-\d{2}-\d{2})").expect("expires iso regex")
});

/// Patterns in precedence order. The first one that yields a date wins.
pub(crate) fn ordered_patterns() -> [(Phrase, &'static Regex); 4] {
    [
        (Phrase::RenewalDate, &*RENEWAL_LONG_RE),
        (Phrase::ExpiresOn, &*EXPIRES_LONG_RE),
        (Phrase::RenewalDate, &*RENEWAL_ISO_RE),
        (Phrase::ExpiresOn, &*EXPIRES_ISO_RE),
    ]
}

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

/// Parse `Month DD, YYYY`, falling back to `YYYY-MM-DD`.
///
/// The month must be spelled out in full, in any case. `%B` alone also
/// accepts abbreviations such as `Jun`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    match NaiveDate::parse_from_str(s, "%B %d, %Y") {
        Ok(date) => has_full_month_name(s, date).then_some(date),
        Err(_) => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
    }
}

fn has_full_month_name(s: &str, date: NaiveDate) -> bool {
    let word = s.split_whitespace().next().unwrap_or_default();
    u8::try_from(date.month())
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .is_some_and(|month| month.name().eq_ignore_ascii_case(word))
}
