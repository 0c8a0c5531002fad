// 🧾 Transaction - parent record grouping the entries of one business event
//
// Created once inside the orchestrator's write scope, never updated.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ledger_entry::conversion_failure;
use crate::error::LedgerError;

// ============================================================================
// TRANSACTION TYPE
// ============================================================================

/// Business kind of a transaction, stored as `transaction_type_id`.
///
/// Ids 1-3 are seeded in the `transaction_type` lookup table; any other
/// positive id is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TransactionType {
    Transfer,
    Withdrawal,
    Deposit,
    Other(i64),
}

impl TransactionType {
    pub fn id(&self) -> i64 {
        match self {
            TransactionType::Transfer => 1,
            TransactionType::Withdrawal => 2,
            TransactionType::Deposit => 3,
            TransactionType::Other(id) => *id,
        }
    }

    pub fn from_id(id: i64) -> Result<Self, LedgerError> {
        match id {
            1 => Ok(TransactionType::Transfer),
            2 => Ok(TransactionType::Withdrawal),
            3 => Ok(TransactionType::Deposit),
            id if id > 3 => Ok(TransactionType::Other(id)),
            id => Err(LedgerError::InvalidTransactionType(id)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransactionType::Transfer => "transfer",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Deposit => "deposit",
            TransactionType::Other(_) => "other",
        }
    }
}

impl TryFrom<i64> for TransactionType {
    type Error = LedgerError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        TransactionType::from_id(id)
    }
}

impl From<TransactionType> for i64 {
    fn from(kind: TransactionType) -> i64 {
        kind.id()
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}

// ============================================================================
// TRANSACTION STATUS
// ============================================================================

/// Processing status, stored as `status_id`.
///
/// Writes are synchronous, so the core only ever records `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
}

impl TransactionStatus {
    pub fn id(&self) -> i64 {
        match self {
            TransactionStatus::Completed => 1,
            TransactionStatus::Pending => 2,
            TransactionStatus::Failed => 3,
        }
    }

    pub fn from_id(id: i64) -> Result<Self, LedgerError> {
        match id {
            1 => Ok(TransactionStatus::Completed),
            2 => Ok(TransactionStatus::Pending),
            3 => Ok(TransactionStatus::Failed),
            id => Err(LedgerError::InvalidStatus(id)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl TryFrom<i64> for TransactionStatus {
    type Error = LedgerError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        TransactionStatus::from_id(id)
    }
}

impl From<TransactionStatus> for i64 {
    fn from(status: TransactionStatus) -> i64 {
        status.id()
    }
}

// ============================================================================
// TRANSACTION RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub description: String,
    pub created_by_user_id: i64,
    pub transaction_date: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
}

impl Transaction {
    pub const COLUMNS: &'static str = "Id_transaction, transaction_type_id, status_id, \
         description, created_by_user_id, transaction_date, processed_at";

    /// Maps a `[transaction]` row by column name.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let type_id: i64 = row.get("transaction_type_id")?;
        let status_id: i64 = row.get("status_id")?;
        let transaction_date: String = row.get("transaction_date")?;
        let processed_at: String = row.get("processed_at")?;

        Ok(Transaction {
            id: row.get("Id_transaction")?,
            transaction_type: TransactionType::from_id(type_id)
                .map_err(|e| conversion_failure(1, e))?,
            status: TransactionStatus::from_id(status_id).map_err(|e| conversion_failure(2, e))?,
            description: row.get("description")?,
            created_by_user_id: row.get("created_by_user_id")?,
            transaction_date: crate::db::parse_timestamp(&transaction_date)
                .map_err(|e| conversion_failure(5, e))?,
            processed_at: crate::db::parse_timestamp(&processed_at)
                .map_err(|e| conversion_failure(6, e))?,
        })
    }
}
