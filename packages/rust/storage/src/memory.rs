//! In-memory [`ContractRepository`] for tests and dry runs.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use renewtrack_shared::{ContractRecord, RenewTrackError, Result};

use crate::repository::ContractRepository;

/// A non-durable contract store holding records in a `Vec`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ContractRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<ContractRecord>>> {
        self.records
            .lock()
            .map_err(|_| RenewTrackError::Storage("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl ContractRepository for MemoryStore {
    async fn exists(&self, filename: &str) -> Result<bool> {
        Ok(self.lock()?.iter().any(|r| r.filename == filename))
    }

    async fn insert(&self, filename: &str, renewal_date: NaiveDate) -> Result<i64> {
        let mut records = self.lock()?;
        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        records.push(ContractRecord {
            id,
            filename: filename.to_string(),
            renewal_date,
            notified: false,
            notified_at: None,
        });
        Ok(id)
    }

    async fn mark_notified(&self, id: i64) -> Result<bool> {
        let mut records = self.lock()?;
        match records.iter_mut().find(|r| r.id == id && !r.notified) {
            Some(record) => {
                record.notified = true;
                record.notified_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, id: i64) -> Result<Option<ContractRecord>> {
        Ok(self.lock()?.iter().find(|r| r.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ContractRecord>> {
        let mut all = self.lock()?.clone();
        all.sort_by_key(|r| r.id);
        Ok(all)
    }

    async fn list_unnotified(&self) -> Result<Vec<ContractRecord>> {
        let mut pending: Vec<_> = self
            .lock()?
            .iter()
            .filter(|r| !r.notified)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.id);
        Ok(pending)
    }
}
