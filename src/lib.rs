// Atomic Ledger - Core Library
// Double-entry ledger writes on SQLite: a transaction and its entries are
// committed together or not at all. Used by the CLI, the API server, and tests.

pub mod accounts;
pub mod batch;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod ledger_store;
pub mod orchestrator;
pub mod queries;
pub mod result;
pub mod transaction_store;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{AccountPolicy, DatabaseConfig, LedgerConfig, ServerConfig};
pub use db::{setup_database, ConnectionFactory, SqliteConnectionFactory};
pub use entities::{EntryType, LedgerEntry, Transaction, TransactionStatus, TransactionType};
pub use error::{ErrorKind, LedgerError, Result};
pub use orchestrator::{
    EntryRef, SimpleReceipt, SimpleTransactionRequest, TransactionService, TransferEntries,
    TransferReceipt, TransferRequest,
};
pub use queries::{LedgerQueries, TransactionDetail};
pub use result::OperationResult;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
