//! Turso Embedded / libSQL storage layer for tracked contracts.
//!
//! The [`Storage`] struct wraps a local libSQL database holding the
//! `contracts` table. It implements [`ContractRepository`]; so does the
//! in-memory [`MemoryStore`].
//!
//! **Access rules:**
//! - `parse` / `notify`: read-write via [`Storage::open`]
//! - `list`: read-only via [`Storage::open_readonly`]

mod memory;
mod migrations;
mod repository;

use std::path::Path;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use libsql::{Connection, Database, params};
use renewtrack_shared::{ContractRecord, DATE_FORMAT, RenewTrackError, Result};

pub use memory::MemoryStore;
pub use repository::ContractRepository;

const SELECT_COLUMNS: &str = "SELECT id, filename, renewal_date, notified, notified_at FROM contracts";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| RenewTrackError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| RenewTrackError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| RenewTrackError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RenewTrackError::Storage(format!(
                "database not found at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| RenewTrackError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| RenewTrackError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        RenewTrackError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        self.upgrade_legacy_contracts().await
    }

    /// Add columns missing from a `contracts` table created outside these
    /// migrations. `CREATE TABLE IF NOT EXISTS` leaves such a table as is.
    async fn upgrade_legacy_contracts(&self) -> Result<()> {
        let mut rows = self
            .conn
            .query(
                "SELECT 1 FROM pragma_table_info('contracts') WHERE name = 'notified_at'",
                params![],
            )
            .await
            .map_err(|e| RenewTrackError::Storage(e.to_string()))?;
        let has_column = rows
            .next()
            .await
            .map_err(|e| RenewTrackError::Storage(e.to_string()))?
            .is_some();
        drop(rows);

        if !has_column {
            tracing::warn!("contracts table predates notified_at, adding column");
            self.conn
                .execute("ALTER TABLE contracts ADD COLUMN notified_at TEXT", params![])
                .await
                .map_err(|e| {
                    RenewTrackError::Storage(format!("cannot add notified_at column: {e}"))
                })?;
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(RenewTrackError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    async fn query_records(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<ContractRecord>> {
        let mut rows = self
            .conn
            .query(sql, params)
            .await
            .map_err(|e| RenewTrackError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| RenewTrackError::Storage(e.to_string()))?
        {
            results.push(row_to_record(&row)?);
        }
        Ok(results)
    }
}

#[async_trait]
impl ContractRepository for Storage {
    async fn exists(&self, filename: &str) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                "SELECT 1 FROM contracts WHERE filename = ?1 LIMIT 1",
                params![filename],
            )
            .await
            .map_err(|e| RenewTrackError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(row) => Ok(row.is_some()),
            Err(e) => Err(RenewTrackError::Storage(e.to_string())),
        }
    }

    async fn insert(&self, filename: &str, renewal_date: NaiveDate) -> Result<i64> {
        self.check_writable()?;
        let date = renewal_date.format(DATE_FORMAT).to_string();
        self.conn
            .execute(
                "INSERT INTO contracts (filename, renewal_date) VALUES (?1, ?2)",
                params![filename, date.as_str()],
            )
            .await
            .map_err(|e| RenewTrackError::Storage(e.to_string()))?;
        Ok(self.conn.last_insert_rowid())
    }

    async fn mark_notified(&self, id: i64) -> Result<bool> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        let changed = self
            .conn
            .execute(
                "UPDATE contracts SET notified = 1, notified_at = ?2
                 WHERE id = ?1 AND notified = 0",
                params![id, now.as_str()],
            )
            .await
            .map_err(|e| RenewTrackError::Storage(e.to_string()))?;
        Ok(changed == 1)
    }

    async fn get(&self, id: i64) -> Result<Option<ContractRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        Ok(self.query_records(&sql, params![id]).await?.into_iter().next())
    }

    async fn list_all(&self) -> Result<Vec<ContractRecord>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY id");
        self.query_records(&sql, params![]).await
    }

    async fn list_unnotified(&self) -> Result<Vec<ContractRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE notified = 0 ORDER BY id");
        self.query_records(&sql, params![]).await
    }
}

/// Convert a database row to a [`ContractRecord`].
fn row_to_record(row: &libsql::Row) -> Result<ContractRecord> {
    Ok(ContractRecord {
        id: row
            .get::<i64>(0)
            .map_err(|e| RenewTrackError::Storage(e.to_string()))?,
        filename: row
            .get::<String>(1)
            .map_err(|e| RenewTrackError::Storage(e.to_string()))?,
        renewal_date: {
            let s: String = row
                .get(2)
                .map_err(|e| RenewTrackError::Storage(e.to_string()))?;
            NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| {
                RenewTrackError::validation(format!("invalid renewal_date {s:?}: {e}"))
            })?
        },
        notified: row
            .get::<i64>(3)
            .map_err(|e| RenewTrackError::Storage(e.to_string()))?
            != 0,
        notified_at: match row.get::<String>(4).ok() {
            Some(s) => Some(
                chrono::DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| RenewTrackError::Storage(format!("invalid date: {e}")))?,
            ),
            None => None,
        },
    })
}
