//! The contract repository seam.
//!
//! Batch jobs talk to storage only through [`ContractRepository`], so the
//! libSQL-backed [`Storage`](crate::Storage) and the in-memory
//! [`MemoryStore`](crate::MemoryStore) are interchangeable.

use async_trait::async_trait;
use chrono::NaiveDate;
use renewtrack_shared::{ContractRecord, Result};

/// Persistence operations over the `contracts` table.
#[async_trait]
pub trait ContractRepository: Send + Sync {
    /// Whether any record has exactly this filename.
    async fn exists(&self, filename: &str) -> Result<bool>;

    /// Append a new unnotified record. Returns the assigned id.
    ///
    /// Does not check for an existing filename; callers do that with
    /// [`exists`](Self::exists).
    async fn insert(&self, filename: &str, renewal_date: NaiveDate) -> Result<i64>;

    /// Flip `notified` to true for one record.
    ///
    /// Returns `false` if the record does not exist or was already notified.
    async fn mark_notified(&self, id: i64) -> Result<bool>;

    /// Fetch one record by id.
    async fn get(&self, id: i64) -> Result<Option<ContractRecord>>;

    /// All records, ordered by id.
    async fn list_all(&self) -> Result<Vec<ContractRecord>>;

    /// Records with `notified = false`, ordered by id.
    async fn list_unnotified(&self) -> Result<Vec<ContractRecord>>;
}
