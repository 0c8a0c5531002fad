// ⚖️ Transaction Orchestrator - the atomic unit of work
//
// One connection, one scope per operation:
//   open scope → insert transaction → insert entries → commit
// Any failure inside the scope rolls everything back. The connection is
// released on every exit path.

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};

use crate::accounts::{self, AccountUse};
use crate::config::{AccountPolicy, LedgerConfig};
use crate::db::{self, ConnectionFactory, SqliteConnectionFactory};
use crate::entities::{EntryType, TransactionStatus, TransactionType};
use crate::error::{LedgerError, Result};
use crate::result::OperationResult;
use crate::{ledger_store, transaction_store};

// ============================================================================
// REQUESTS
// ============================================================================

/// Move `amount` from one account to another: one debit, one credit.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
    pub description: String,
    pub actor_user_id: i64,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
}

impl TransferRequest {
    pub fn new(
        from_account_id: i64,
        to_account_id: i64,
        amount: Decimal,
        description: impl Into<String>,
        actor_user_id: i64,
    ) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
            description: description.into(),
            actor_user_id,
            transaction_type: TransactionType::Transfer,
            status: TransactionStatus::Completed,
        }
    }

    pub fn with_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }
}

/// Single-entry movement against an implicit external counterparty.
#[derive(Debug, Clone)]
pub struct SimpleTransactionRequest {
    pub account_id: i64,
    pub amount: Decimal,
    pub entry_type: EntryType,
    pub description: String,
    pub actor_user_id: i64,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
}

impl SimpleTransactionRequest {
    /// Defaults to the withdrawal type id (2) whatever the entry type.
    pub fn new(
        account_id: i64,
        amount: Decimal,
        entry_type: EntryType,
        description: impl Into<String>,
        actor_user_id: i64,
    ) -> Self {
        Self {
            account_id,
            amount,
            entry_type,
            description: description.into(),
            actor_user_id,
            transaction_type: TransactionType::Withdrawal,
            status: TransactionStatus::Completed,
        }
    }

    /// Credit typed as a deposit (3).
    pub fn deposit(
        account_id: i64,
        amount: Decimal,
        description: impl Into<String>,
        actor_user_id: i64,
    ) -> Self {
        Self::new(account_id, amount, EntryType::Credit, description, actor_user_id)
            .with_type(TransactionType::Deposit)
    }

    /// Debit typed as a withdrawal (2).
    pub fn withdrawal(
        account_id: i64,
        amount: Decimal,
        description: impl Into<String>,
        actor_user_id: i64,
    ) -> Self {
        Self::new(account_id, amount, EntryType::Debit, description, actor_user_id)
    }

    pub fn with_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }
}

// ============================================================================
// RECEIPTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryRef {
    pub id: i64,
    pub account_id: i64,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferEntries {
    pub debit: EntryRef,
    pub credit: EntryRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferReceipt {
    pub transaction_id: i64,
    pub ledger_entries: TransferEntries,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleReceipt {
    pub transaction_id: i64,
    pub ledger_entry_id: i64,
    pub entry_type: EntryType,
}

// ============================================================================
// SERVICE
// ============================================================================

/// Owns commit/rollback for every ledger write.
#[derive(Clone)]
pub struct TransactionService {
    factory: Arc<dyn ConnectionFactory>,
    account_policy: AccountPolicy,
}

impl TransactionService {
    pub fn new(factory: Arc<dyn ConnectionFactory>) -> Self {
        Self {
            factory,
            account_policy: AccountPolicy::Unchecked,
        }
    }

    /// SQLite-backed service for `config`; the schema is not touched.
    pub fn from_config(config: &LedgerConfig) -> Self {
        let factory = SqliteConnectionFactory::new(config.database.clone());
        Self::new(Arc::new(factory)).with_account_policy(config.accounts)
    }

    pub fn with_account_policy(mut self, policy: AccountPolicy) -> Self {
        self.account_policy = policy;
        self
    }

    pub fn factory(&self) -> Arc<dyn ConnectionFactory> {
        Arc::clone(&self.factory)
    }

    // ------------------------------------------------------------------------
    // Transfer protocol
    // ------------------------------------------------------------------------

    /// Records a two-entry transfer atomically.
    pub fn create_transfer(&self, request: TransferRequest) -> Result<TransferReceipt> {
        let span = info_span!(
            "transfer",
            from = request.from_account_id,
            to = request.to_account_id,
            amount = %request.amount
        );
        let _guard = span.enter();
        info!("starting transfer");

        if request.amount <= Decimal::ZERO {
            warn!("rejected: non-positive amount");
            return Err(LedgerError::NonPositiveAmount);
        }
        if request.from_account_id == request.to_account_id {
            warn!("rejected: same source and destination");
            return Err(LedgerError::SameAccount);
        }

        let receipt = self.atomically(|scope| {
            accounts::enforce(
                scope,
                self.account_policy,
                request.actor_user_id,
                &[
                    AccountUse::debit(request.from_account_id),
                    AccountUse::credit(request.to_account_id),
                ],
            )?;

            let transaction_id = transaction_store::insert(
                scope,
                request.transaction_type,
                request.status,
                &request.description,
                request.actor_user_id,
            )?;

            let debit_id = ledger_store::insert(
                scope,
                transaction_id,
                request.from_account_id,
                request.amount,
                EntryType::Debit,
            )?;

            let credit_id = ledger_store::insert(
                scope,
                transaction_id,
                request.to_account_id,
                request.amount,
                EntryType::Credit,
            )?;

            Ok(TransferReceipt {
                transaction_id,
                ledger_entries: TransferEntries {
                    debit: EntryRef {
                        id: debit_id,
                        account_id: request.from_account_id,
                        entry_type: EntryType::Debit,
                    },
                    credit: EntryRef {
                        id: credit_id,
                        account_id: request.to_account_id,
                        entry_type: EntryType::Credit,
                    },
                },
            })
        })?;

        info!(
            transaction_id = receipt.transaction_id,
            debit_entry = receipt.ledger_entries.debit.id,
            credit_entry = receipt.ledger_entries.credit.id,
            "transfer committed"
        );
        Ok(receipt)
    }

    /// Never-failing form of [`create_transfer`](Self::create_transfer).
    pub fn transfer(&self, request: TransferRequest) -> OperationResult<TransferReceipt> {
        self.create_transfer(request).into()
    }

    // ------------------------------------------------------------------------
    // Simple transaction protocol
    // ------------------------------------------------------------------------

    /// Records a single-entry transaction atomically.
    pub fn create_simple_transaction(
        &self,
        request: SimpleTransactionRequest,
    ) -> Result<SimpleReceipt> {
        let span = info_span!(
            "simple_transaction",
            account = request.account_id,
            entry_type = request.entry_type.as_str(),
            amount = %request.amount
        );
        let _guard = span.enter();
        info!("starting simple transaction");

        if request.amount <= Decimal::ZERO {
            warn!("rejected: non-positive amount");
            return Err(LedgerError::NonPositiveAmount);
        }

        let account_use = match request.entry_type {
            EntryType::Debit => AccountUse::debit(request.account_id),
            EntryType::Credit => AccountUse::credit(request.account_id),
        };

        let receipt = self.atomically(|scope| {
            accounts::enforce(scope, self.account_policy, request.actor_user_id, &[account_use])?;

            let transaction_id = transaction_store::insert(
                scope,
                request.transaction_type,
                request.status,
                &request.description,
                request.actor_user_id,
            )?;

            let ledger_entry_id = ledger_store::insert(
                scope,
                transaction_id,
                request.account_id,
                request.amount,
                request.entry_type,
            )?;

            Ok(SimpleReceipt {
                transaction_id,
                ledger_entry_id,
                entry_type: request.entry_type,
            })
        })?;

        info!(
            transaction_id = receipt.transaction_id,
            ledger_entry = receipt.ledger_entry_id,
            "simple transaction committed"
        );
        Ok(receipt)
    }

    /// Never-failing form of [`create_simple_transaction`](Self::create_simple_transaction).
    pub fn simple_transaction(
        &self,
        request: SimpleTransactionRequest,
    ) -> OperationResult<SimpleReceipt> {
        self.create_simple_transaction(request).into()
    }

    // ------------------------------------------------------------------------
    // Scope handling
    // ------------------------------------------------------------------------

    /// Runs `work` inside one write scope and commits, or rolls back on error.
    fn atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.factory.connect()?;
        let outcome = run_scope(&mut conn, work);

        drop(conn);
        debug!("ledger connection released");
        outcome
    }
}

fn run_scope<T, F>(conn: &mut rusqlite::Connection, work: F) -> Result<T>
where
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
{
    let scope = db::begin_scope(conn)?;

    match work(&scope) {
        Ok(value) => {
            // A failed COMMIT drops the scope, which rolls it back.
            if let Err(e) = scope.commit() {
                error!(error = %e, "commit failed, nothing persisted");
                return Err(e.into());
            }
            Ok(value)
        }
        Err(e) => {
            error!(error = %e, "operation failed, rolling back");
            match scope.rollback() {
                Ok(()) => info!("rollback complete, nothing persisted"),
                Err(rollback_err) => error!(error = %rollback_err, "rollback failed"),
            }
            Err(e)
        }
    }
}
