// 📒 Ledger Entry - one half of a double-entry movement
//
// An entry is tied to exactly one transaction and one account, carries a
// strictly positive amount, and is tagged debit or credit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rusqlite::types::Type;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

// ============================================================================
// ENTRY TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Money leaves the account.
    Debit,
    /// Money enters the account.
    Credit,
}

impl EntryType {
    /// Literal stored in `ledger_entry.entry_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Debit => "debit",
            EntryType::Credit => "credit",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-sensitive: only the exact literals `debit` and `credit` parse.
impl FromStr for EntryType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(EntryType::Debit),
            "credit" => Ok(EntryType::Credit),
            other => Err(LedgerError::InvalidEntryType(other.to_string())),
        }
    }
}

// ============================================================================
// LEDGER ENTRY RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub transaction_id: i64,
    pub account_id: i64,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Columns selected by every ledger_entry read, in the order `from_row` expects.
    pub const COLUMNS: &'static str =
        "Id_entry, transaction_id, account_id, entry_type, amount, created_at";

    /// Maps a `ledger_entry` row by column name.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let entry_type: String = row.get("entry_type")?;
        let amount: String = row.get("amount")?;
        let created_at: String = row.get("created_at")?;

        Ok(LedgerEntry {
            id: row.get("Id_entry")?,
            transaction_id: row.get("transaction_id")?,
            account_id: row.get("account_id")?,
            entry_type: entry_type
                .parse()
                .map_err(|e| conversion_failure(3, e))?,
            amount: Decimal::from_str(&amount).map_err(|e| conversion_failure(4, e))?,
            created_at: crate::db::parse_timestamp(&created_at)
                .map_err(|e| conversion_failure(5, e))?,
        })
    }

    /// Signed effect on the account: credits positive, debits negative.
    pub fn signed_amount(&self) -> Decimal {
        match self.entry_type {
            EntryType::Credit => self.amount,
            EntryType::Debit => -self.amount,
        }
    }
}

pub(crate) fn conversion_failure<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_entry_type_parse_is_case_sensitive() {
        assert_eq!("debit".parse::<EntryType>().unwrap(), EntryType::Debit);
        assert_eq!("credit".parse::<EntryType>().unwrap(), EntryType::Credit);

        for bad in ["Debit", "CREDIT", "", " debit", "refund"] {
            let err = bad.parse::<EntryType>().unwrap_err();
            assert!(matches!(err, LedgerError::InvalidEntryType(ref s) if s == bad));
        }
    }

    #[test]
    fn test_entry_type_serde_uses_literals() {
        assert_eq!(serde_json::to_string(&EntryType::Debit).unwrap(), "\"debit\"");
        let parsed: EntryType = serde_json::from_str("\"credit\"").unwrap();
        assert_eq!(parsed, EntryType::Credit);
        assert!(serde_json::from_str::<EntryType>("\"Credit\"").is_err());
    }

    #[test]
    fn test_signed_amount() {
        let mut entry = LedgerEntry {
            id: 1,
            transaction_id: 1,
            account_id: 9,
            entry_type: EntryType::Debit,
            amount: dec!(12.50),
            created_at: Utc::now(),
        };
        assert_eq!(entry.signed_amount(), dec!(-12.50));

        entry.entry_type = EntryType::Credit;
        assert_eq!(entry.signed_amount(), dec!(12.50));
    }
}
