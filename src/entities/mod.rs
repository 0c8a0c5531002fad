// Ledger records
// Strongly-typed rows, mapped by column name at the store boundary.

pub mod ledger_entry;
pub mod transaction;

pub use ledger_entry::{EntryType, LedgerEntry};
pub use transaction::{Transaction, TransactionStatus, TransactionType};
