// Ledger error taxonomy
// Validation failures are caught before any store I/O; everything else happens
// inside (or while opening) a write scope and forces a rollback.

use thiserror::Error;

/// Result alias used across the ledger core.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, rejected before any write.
    Validation,
    /// The store accepted a write but could not hand back what we need.
    Persistence,
    /// No connection or scope could be obtained.
    StoreConnection,
    /// Any other driver failure.
    Store,
    /// Configuration could not be loaded.
    Config,
    /// Batch input could not be read.
    Input,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    // ========================================================================
    // VALIDATION
    // ========================================================================
    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("source and destination accounts must differ")]
    SameAccount,

    #[error("invalid entry_type '{0}': expected 'debit' or 'credit'")]
    InvalidEntryType(String),

    #[error("invalid transaction type id {0}")]
    InvalidTransactionType(i64),

    #[error("invalid transaction status id {0}")]
    InvalidStatus(i64),

    #[error("account {0} does not exist")]
    AccountNotFound(i64),

    #[error("account {account_id} does not belong to user {user_id}")]
    AccountNotOwned { account_id: i64, user_id: i64 },

    #[error("invalid operation at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    // ========================================================================
    // PERSISTENCE
    // ========================================================================
    /// The last-inserted-id query came back empty after an insert.
    #[error("store returned no identifier for the new {0} row")]
    MissingIdentifier(&'static str),

    // ========================================================================
    // STORE
    // ========================================================================
    #[error("could not open ledger store: {0}")]
    StoreConnection(#[source] rusqlite::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NonPositiveAmount
            | Self::SameAccount
            | Self::InvalidEntryType(_)
            | Self::InvalidTransactionType(_)
            | Self::InvalidStatus(_)
            | Self::AccountNotFound(_)
            | Self::AccountNotOwned { .. }
            | Self::InvalidRecord { .. } => ErrorKind::Validation,
            Self::MissingIdentifier(_) => ErrorKind::Persistence,
            Self::StoreConnection(_) => ErrorKind::StoreConnection,
            Self::Database(_) => ErrorKind::Store,
            Self::Config(_) => ErrorKind::Config,
            Self::Csv(_) => ErrorKind::Input,
        }
    }

    /// Stable code for machine consumers (CLI/HTTP result bodies).
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount => "NON_POSITIVE_AMOUNT",
            Self::SameAccount => "SAME_ACCOUNT",
            Self::InvalidEntryType(_) => "INVALID_ENTRY_TYPE",
            Self::InvalidTransactionType(_) => "INVALID_TRANSACTION_TYPE",
            Self::InvalidStatus(_) => "INVALID_STATUS",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountNotOwned { .. } => "ACCOUNT_NOT_OWNED",
            Self::InvalidRecord { .. } => "INVALID_RECORD",
            Self::MissingIdentifier(_) => "MISSING_IDENTIFIER",
            Self::StoreConnection(_) => "STORE_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Csv(_) => "CSV_ERROR",
        }
    }
}
