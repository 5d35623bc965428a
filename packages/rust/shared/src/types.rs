//! Core domain types for renewtrack.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storage format for `renewal_date` (ISO 8601 calendar date).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 tagging one batch run (parse or notify) in logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ContractRecord
// ---------------------------------------------------------------------------

/// A tracked contract, one row of the `contracts` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
    /// Store-assigned identifier.
    pub id: i64,
    /// Source document file name; the dedup key.
    pub filename: String,
    /// Date the contract is due for renewal.
    pub renewal_date: NaiveDate,
    /// Whether a reminder has been dispatched. Only ever goes false → true.
    pub notified: bool,
    /// When the reminder was dispatched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notified_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// RenewalWindow
// ---------------------------------------------------------------------------

/// Inclusive date range `[today, today + lookahead_days]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RenewalWindow {
    /// Build the window starting at `today`. Saturates at the maximum date.
    pub fn from_today(today: NaiveDate, lookahead_days: u32) -> Self {
        let end = today
            .checked_add_days(Days::new(u64::from(lookahead_days)))
            .unwrap_or(NaiveDate::MAX);
        Self { start: today, end }
    }

    /// Whether `date` falls inside the window (both ends inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl std::fmt::Display for RenewalWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}
