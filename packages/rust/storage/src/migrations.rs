//! SQL migration definitions for the renewtrack database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: contracts",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Tracked contracts. filename is deliberately not UNIQUE: dedup happens in
-- the ingestor via an existence check.
CREATE TABLE IF NOT EXISTS contracts (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    filename     TEXT NOT NULL,
    renewal_date TEXT NOT NULL,
    notified     INTEGER NOT NULL DEFAULT 0,
    notified_at  TEXT
);

CREATE INDEX IF NOT EXISTS idx_contracts_filename ON contracts(filename);
CREATE INDEX IF NOT EXISTS idx_contracts_notified ON contracts(notified);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
