use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use std::time::Duration;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::{LedgerError, Result};

// ============================================================================
// CONNECTION FACTORY
// ============================================================================

/// Hands out fresh connections to the ledger store.
///
/// Every write scope and every read helper asks the factory for its own
/// connection; nothing holds a connection between calls.
pub trait ConnectionFactory: Send + Sync {
    fn connect(&self) -> Result<Connection>;
}

/// Opens SQLite connections for the configured database file.
#[derive(Debug, Clone)]
pub struct SqliteConnectionFactory {
    config: DatabaseConfig,
}

impl SqliteConnectionFactory {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    /// Opens a connection and makes sure the schema exists.
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connect()?;
        setup_database(&conn, self.config.wal)
    }
}

impl ConnectionFactory for SqliteConnectionFactory {
    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.config.path).map_err(LedgerError::StoreConnection)?;
        conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))
            .map_err(LedgerError::StoreConnection)?;
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(LedgerError::StoreConnection)?;

        debug!(path = %self.config.path.display(), "opened ledger connection");
        Ok(conn)
    }
}

/// Starts the single write scope of an orchestrated operation.
///
/// `BEGIN IMMEDIATE` takes the write lock up front, so concurrent writers
/// queue on `busy_timeout` instead of interleaving.
pub fn begin_scope(conn: &mut Connection) -> Result<rusqlite::Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(LedgerError::StoreConnection)
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection, wal: bool) -> Result<()> {
    if wal {
        // Enable WAL mode for crash recovery
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(mode = %mode, "journal mode set");
    }

    // ==========================================================================
    // Externally-owned tables (referenced by id only)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS [user] (
            Id_user INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            full_name TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS account (
            Id_account INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES [user](Id_user),
            account_number TEXT UNIQUE NOT NULL,
            currency TEXT NOT NULL,
            status_id INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Lookup tables
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS transaction_type (
            Id_type INTEGER PRIMARY KEY,
            name TEXT UNIQUE NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO transaction_type (Id_type, name)
         VALUES (1, 'transfer'), (2, 'withdrawal'), (3, 'deposit')",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transaction_status (
            Id_status INTEGER PRIMARY KEY,
            name TEXT UNIQUE NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO transaction_status (Id_status, name)
         VALUES (1, 'completed'), (2, 'pending'), (3, 'failed')",
        [],
    )?;

    // ==========================================================================
    // Ledger tables
    // AUTOINCREMENT keeps ids strictly increasing across committed rows.
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS [transaction] (
            Id_transaction INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_type_id INTEGER NOT NULL,
            status_id INTEGER NOT NULL,
            description TEXT NOT NULL,
            created_by_user_id INTEGER NOT NULL,
            transaction_date TEXT NOT NULL,
            processed_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS ledger_entry (
            Id_entry INTEGER PRIMARY KEY AUTOINCREMENT,
            transaction_id INTEGER NOT NULL REFERENCES [transaction](Id_transaction),
            account_id INTEGER NOT NULL,
            entry_type TEXT NOT NULL CHECK (entry_type IN ('debit', 'credit')),
            amount TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ledger_entry_transaction
         ON ledger_entry(transaction_id, created_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ledger_entry_account ON ledger_entry(account_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

/// Generated key of the most recent insert on this connection.
///
/// SQLite reports 0 when nothing has been inserted yet, which is treated the
/// same as an empty result.
pub fn last_inserted_id(conn: &Connection, table: &'static str) -> Result<i64> {
    let id: Option<i64> = conn
        .query_row("SELECT last_insert_rowid()", [], |row| row.get(0))
        .optional()?
        .flatten();

    match id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(LedgerError::MissingIdentifier(table)),
    }
}

/// Renders a timestamp the way every ledger column stores it.
///
/// Fixed microsecond precision keeps text order equal to time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

/// Count rows in a ledger table; used by the CLI `init` summary and tests.
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM [{table}]");
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count)
}
