// 🧾 Transaction Store - parent rows of the ledger
// Writes only inside a caller-owned scope; never commits or rolls back.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::db::{format_timestamp, last_inserted_id};
use crate::entities::{Transaction, TransactionStatus, TransactionType};
use crate::error::Result;

/// Inserts the parent transaction row and returns its generated id.
///
/// `transaction_date` and `processed_at` are both stamped now: writes are
/// synchronous, there is no pending window to model.
pub fn insert(
    scope: &rusqlite::Transaction<'_>,
    transaction_type: TransactionType,
    status: TransactionStatus,
    description: &str,
    actor_user_id: i64,
) -> Result<i64> {
    let now = format_timestamp(&Utc::now());

    scope.execute(
        "INSERT INTO [transaction] (
            transaction_type_id, status_id, description, created_by_user_id,
            transaction_date, processed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            transaction_type.id(),
            status.id(),
            description,
            actor_user_id,
            now,
            now,
        ],
    )?;

    let id = last_inserted_id(scope, "transaction")?;
    debug!(transaction_id = id, kind = %transaction_type, "transaction row inserted");
    Ok(id)
}

/// Strict lookup by id; errors propagate.
pub fn select_by_id(conn: &Connection, transaction_id: i64) -> Result<Option<Transaction>> {
    let sql = format!(
        "SELECT {} FROM [transaction] WHERE Id_transaction = ?1",
        Transaction::COLUMNS
    );
    let tx = conn
        .query_row(&sql, [transaction_id], Transaction::from_row)
        .optional()?;
    Ok(tx)
}
