// 📥 Batch import - run ledger operations from a CSV file
//
// Header: kind,from_account,to_account,account,amount,entry_type,description,actor,type_id
// kind is one of transfer | deposit | withdrawal | simple. Every row is its
// own atomic operation; a bad row is reported and the import moves on.

use csv::{Position, ReaderBuilder, Trim};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::entities::{EntryType, TransactionType};
use crate::error::{LedgerError, Result};
use crate::orchestrator::{
    SimpleReceipt, SimpleTransactionRequest, TransactionService, TransferReceipt, TransferRequest,
};
use crate::result::OperationResult;

/// One CSV row as written by the operator; fields a kind does not use stay empty.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationRecord {
    pub kind: String,
    #[serde(default)]
    pub from_account: Option<i64>,
    #[serde(default)]
    pub to_account: Option<i64>,
    #[serde(default)]
    pub account: Option<i64>,
    pub amount: String,
    #[serde(default)]
    pub entry_type: Option<String>,
    #[serde(default)]
    pub description: String,
    pub actor: i64,
    #[serde(default)]
    pub type_id: Option<i64>,
}

/// A parsed row, ready for the orchestrator.
#[derive(Debug, Clone)]
pub enum Operation {
    Transfer(TransferRequest),
    Simple(SimpleTransactionRequest),
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Receipt {
    Transfer(TransferReceipt),
    Simple(SimpleReceipt),
}

#[derive(Debug, Serialize)]
pub struct RowOutcome {
    pub row: usize,
    #[serde(flatten)]
    pub result: OperationResult<Receipt>,
}

#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub rows: Vec<RowOutcome>,
}

impl OperationRecord {
    /// Turns the raw row into a request; `row` is the 1-based line number.
    pub fn parse(&self, row: usize) -> Result<Operation> {
        let invalid = |message: String| LedgerError::InvalidRecord { row, message };

        let amount = Decimal::from_str(self.amount.trim())
            .map_err(|e| invalid(format!("amount '{}': {e}", self.amount)))?;
        let require = |value: Option<i64>, field: &str| {
            value.ok_or_else(|| invalid(format!("{} requires {field}", self.kind)))
        };

        let operation = match self.kind.as_str() {
            "transfer" => Operation::Transfer(TransferRequest::new(
                require(self.from_account, "from_account")?,
                require(self.to_account, "to_account")?,
                amount,
                self.description.clone(),
                self.actor,
            )),
            "deposit" => Operation::Simple(SimpleTransactionRequest::deposit(
                require(self.account, "account")?,
                amount,
                self.description.clone(),
                self.actor,
            )),
            "withdrawal" => Operation::Simple(SimpleTransactionRequest::withdrawal(
                require(self.account, "account")?,
                amount,
                self.description.clone(),
                self.actor,
            )),
            "simple" => {
                let literal = self
                    .entry_type
                    .as_deref()
                    .ok_or_else(|| invalid("simple requires entry_type".to_string()))?;
                Operation::Simple(SimpleTransactionRequest::new(
                    require(self.account, "account")?,
                    amount,
                    EntryType::from_str(literal)?,
                    self.description.clone(),
                    self.actor,
                ))
            }
            other => return Err(invalid(format!("unknown kind '{other}'"))),
        };

        match self.type_id {
            None => Ok(operation),
            Some(id) => {
                let kind = TransactionType::from_id(id)?;
                Ok(match operation {
                    Operation::Transfer(req) => Operation::Transfer(req.with_type(kind)),
                    Operation::Simple(req) => Operation::Simple(req.with_type(kind)),
                })
            }
        }
    }
}

impl Operation {
    pub fn execute(self, service: &TransactionService) -> OperationResult<Receipt> {
        let result = match self {
            Operation::Transfer(req) => service.create_transfer(req).map(Receipt::Transfer),
            Operation::Simple(req) => service.create_simple_transaction(req).map(Receipt::Simple),
        };
        result.into()
    }
}

/// Runs every row of `reader` through `service`.
///
/// Only an unreadable header is fatal; row-level problems end up in the report.
pub fn import_csv<R: Read>(service: &TransactionService, reader: R) -> Result<BatchReport> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut report = BatchReport::default();

    for (idx, raw) in rdr.records().enumerate() {
        // Blank lines and quoted newlines make the record index drift from
        // the file, so the reported row comes from the reader position.
        let fallback = idx + 2;
        let (row, record) = match raw {
            Ok(raw) => (
                line_of(raw.position(), fallback),
                raw.deserialize::<OperationRecord>(Some(&headers))
                    .map_err(|e| e.to_string()),
            ),
            Err(e) => (line_of(e.position(), fallback), Err(e.to_string())),
        };

        let outcome = match record {
            Ok(record) => match record.parse(row) {
                Ok(operation) => operation.execute(service),
                Err(e) => OperationResult::failure(&e),
            },
            Err(message) => {
                OperationResult::failure(&LedgerError::InvalidRecord { row, message })
            }
        };

        if outcome.success {
            report.succeeded += 1;
        } else {
            warn!(row, error = outcome.error.as_deref().unwrap_or(""), "row rejected");
            report.failed += 1;
        }
        report.rows.push(RowOutcome { row, result: outcome });
    }

    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "batch import finished"
    );
    Ok(report)
}

fn line_of(position: Option<&Position>, fallback: usize) -> usize {
    position.map_or(fallback, |p| p.line() as usize)
}

pub fn import_path(service: &TransactionService, path: &Path) -> Result<BatchReport> {
    let file = std::fs::File::open(path)
        .map_err(|e| LedgerError::Csv(csv::Error::from(e)))?;
    import_csv(service, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::db::{count_rows, ConnectionFactory, SqliteConnectionFactory};
    use std::io::Cursor;
    use std::sync::Arc;

    const HEADER: &str = "kind,from_account,to_account,account,amount,entry_type,description,actor,type_id\n";

    fn record(kind: &str) -> OperationRecord {
        OperationRecord {
            kind: kind.to_string(),
            from_account: None,
            to_account: None,
            account: None,
            amount: "10.00".to_string(),
            entry_type: None,
            description: "test".to_string(),
            actor: 1,
            type_id: None,
        }
    }

    fn service() -> (tempfile::TempDir, Arc<SqliteConnectionFactory>, TransactionService) {
        let dir = tempfile::tempdir().unwrap();
        let factory = Arc::new(SqliteConnectionFactory::new(
            LedgerConfig::for_path(dir.path().join("batch.db")).database,
        ));
        factory.initialize().unwrap();
        let service = TransactionService::new(factory.clone());
        (dir, factory, service)
    }

    #[test]
    fn test_parse_transfer_requires_both_accounts() {
        let mut rec = record("transfer");
        rec.from_account = Some(1);
        let err = rec.parse(4).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid operation at row 4: transfer requires to_account"
        );

        rec.to_account = Some(2);
        assert!(matches!(rec.parse(4).unwrap(), Operation::Transfer(_)));
    }

    #[test]
    fn test_parse_simple_entry_type_is_case_sensitive() {
        let mut rec = record("simple");
        rec.account = Some(3);
        rec.entry_type = Some("Credit".to_string());
        assert!(matches!(rec.parse(2), Err(LedgerError::InvalidEntryType(_))));

        rec.entry_type = Some("credit".to_string());
        match rec.parse(2).unwrap() {
            Operation::Simple(req) => {
                assert_eq!(req.entry_type, EntryType::Credit);
                assert_eq!(req.transaction_type, TransactionType::Withdrawal);
            }
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn test_parse_type_override_and_bad_amount() {
        let mut rec = record("deposit");
        rec.account = Some(1);
        rec.type_id = Some(12);
        match rec.parse(2).unwrap() {
            Operation::Simple(req) => assert_eq!(req.transaction_type, TransactionType::Other(12)),
            other => panic!("unexpected operation {other:?}"),
        }

        rec.amount = "ten".to_string();
        assert!(matches!(rec.parse(2), Err(LedgerError::InvalidRecord { row: 2, .. })));

        let rec = record("refund");
        assert!(rec.parse(2).unwrap_err().to_string().contains("unknown kind 'refund'"));
    }

    #[test]
    fn test_import_runs_each_row_atomically() {
        let (_dir, factory, service) = service();
        let csv = format!(
            "{HEADER}\
             transfer,1,2,,100.00,,rent,7,\n\
             deposit,,,1,50.00,,salary,1,\n\
             transfer,5,5,,10.00,,loop,1,\n\
             withdrawal,,,1,-5.00,,bad,1,\n\
             simple,,,2,3.50,debit,fee,1,\n"
        );

        let report = import_csv(&service, Cursor::new(csv)).unwrap();

        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed, 2);
        assert_eq!(report.rows[2].row, 4);
        assert_eq!(
            report.rows[2].result.error.as_deref(),
            Some("source and destination accounts must differ")
        );
        assert_eq!(
            report.rows[3].result.error.as_deref(),
            Some("amount must be greater than zero")
        );

        let conn = factory.connect().unwrap();
        assert_eq!(count_rows(&conn, "transaction").unwrap(), 3);
        assert_eq!(count_rows(&conn, "ledger_entry").unwrap(), 4);
    }

    #[test]
    fn test_report_serializes_per_row_results() {
        let (_dir, _factory, service) = service();
        let csv = format!("{HEADER}deposit,,,9,1,,tip,2,\n");
        let report = import_csv(&service, Cursor::new(csv)).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["succeeded"], 1);
        assert_eq!(json["rows"][0]["row"], 2);
        assert_eq!(json["rows"][0]["success"], true);
        assert_eq!(json["rows"][0]["entry_type"], "credit");
    }

    #[test]
    fn test_missing_file() {
        let (_dir, _factory, service) = service();
        let err = import_path(&service, Path::new("/nonexistent/ops.csv")).unwrap_err();
        assert!(matches!(err, LedgerError::Csv(_)));
    }

    #[test]
    fn test_rows_are_numbered_by_file_line() {
        let (_dir, _factory, service) = service();
        let csv = format!(
            "{HEADER}\
             \n\
             transfer,1,2,,10.00,,ok,1,\n\
             \n\
             transfer,5,5,,10.00,,loop,1,\n\
             deposit,,,1,5.00,,\"two\nlines\",1,\n\
             deposit,,,1,0,,zero,1,\n"
        );

        let report = import_csv(&service, Cursor::new(csv)).unwrap();

        let rows: Vec<(usize, bool)> = report
            .rows
            .iter()
            .map(|outcome| (outcome.row, outcome.result.success))
            .collect();
        assert_eq!(rows, vec![(3, true), (5, false), (6, true), (8, false)]);
    }
}
