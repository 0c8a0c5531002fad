// 🔍 Query Helpers - read-only views outside any write scope
//
// Lenient by policy: a failed read is logged and reported as "nothing found".
// Callers treat an empty list or `None` as a valid state.

use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::db::ConnectionFactory;
use crate::entities::{LedgerEntry, Transaction};
use crate::error::Result;
use crate::{ledger_store, transaction_store};

/// A transaction together with its entries.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetail {
    pub transaction: Transaction,
    pub entries: Vec<LedgerEntry>,
}

/// Read helpers; each call opens and releases its own connection.
#[derive(Clone)]
pub struct LedgerQueries {
    factory: Arc<dyn ConnectionFactory>,
}

impl LedgerQueries {
    pub fn new(factory: Arc<dyn ConnectionFactory>) -> Self {
        Self { factory }
    }

    /// Entries of a transaction ordered by `created_at` ascending.
    ///
    /// Returns an empty list on any failure.
    pub fn list_by_transaction(&self, transaction_id: i64) -> Vec<LedgerEntry> {
        let result = self
            .factory
            .connect()
            .and_then(|conn| ledger_store::select_by_transaction(&conn, transaction_id));

        match result {
            Ok(entries) => entries,
            Err(e) => {
                warn!(transaction_id, error = %e, "could not list ledger entries");
                Vec::new()
            }
        }
    }

    /// A single entry, or `None` when missing or unreadable.
    pub fn get_by_id(&self, entry_id: i64) -> Option<LedgerEntry> {
        lenient(
            self.factory
                .connect()
                .and_then(|conn| ledger_store::select_by_id(&conn, entry_id)),
            "ledger entry",
            entry_id,
        )
    }

    /// The parent transaction record, or `None` when missing or unreadable.
    pub fn get_transaction(&self, transaction_id: i64) -> Option<Transaction> {
        lenient(
            self.factory
                .connect()
                .and_then(|conn| transaction_store::select_by_id(&conn, transaction_id)),
            "transaction",
            transaction_id,
        )
    }

    /// Transaction plus entries read on one connection.
    pub fn transaction_detail(&self, transaction_id: i64) -> Option<TransactionDetail> {
        let result = self.factory.connect().and_then(|conn| {
            let Some(transaction) = transaction_store::select_by_id(&conn, transaction_id)? else {
                return Ok(None);
            };
            let entries = ledger_store::select_by_transaction(&conn, transaction_id)?;
            Ok(Some(TransactionDetail {
                transaction,
                entries,
            }))
        });

        lenient(result, "transaction detail", transaction_id)
    }
}

fn lenient<T>(result: Result<Option<T>>, what: &str, id: i64) -> Option<T> {
    match result {
        Ok(Some(found)) => Some(found),
        Ok(None) => {
            warn!(id, "{what} not found");
            None
        }
        Err(e) => {
            warn!(id, error = %e, "could not read {what}");
            None
        }
    }
}
