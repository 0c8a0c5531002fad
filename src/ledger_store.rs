// 📒 Ledger Entry Store - debit/credit rows
// Writes only inside a caller-owned scope; atomicity belongs to the orchestrator.

use chrono::Utc;
use rust_decimal::Decimal;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::db::{format_timestamp, last_inserted_id};
use crate::entities::{EntryType, LedgerEntry};
use crate::error::{LedgerError, Result};

/// Inserts one ledger entry on `scope` and returns its generated id.
///
/// The amount is checked before any statement runs.
pub fn insert(
    scope: &rusqlite::Transaction<'_>,
    transaction_id: i64,
    account_id: i64,
    amount: Decimal,
    entry_type: EntryType,
) -> Result<i64> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount);
    }

    let created_at = format_timestamp(&Utc::now());

    debug!(
        transaction_id,
        account_id,
        %amount,
        entry_type = entry_type.as_str(),
        "inserting ledger entry"
    );

    scope.execute(
        "INSERT INTO ledger_entry (transaction_id, account_id, entry_type, amount, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            transaction_id,
            account_id,
            entry_type.as_str(),
            amount.to_string(),
            created_at,
        ],
    )?;

    let id = last_inserted_id(scope, "ledger_entry")?;
    debug!(entry_id = id, "ledger entry inserted");
    Ok(id)
}

/// Strict read of every entry of a transaction, oldest first.
pub fn select_by_transaction(conn: &Connection, transaction_id: i64) -> Result<Vec<LedgerEntry>> {
    let sql = format!(
        "SELECT {} FROM ledger_entry
         WHERE transaction_id = ?1
         ORDER BY created_at ASC, Id_entry ASC",
        LedgerEntry::COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;

    let entries = stmt
        .query_map([transaction_id], LedgerEntry::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(entries)
}

/// Strict read of a single entry.
pub fn select_by_id(conn: &Connection, entry_id: i64) -> Result<Option<LedgerEntry>> {
    let sql = format!(
        "SELECT {} FROM ledger_entry WHERE Id_entry = ?1",
        LedgerEntry::COLUMNS
    );
    let entry = conn
        .query_row(&sql, [entry_id], LedgerEntry::from_row)
        .optional()?;
    Ok(entry)
}
