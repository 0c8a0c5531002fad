// Shared fixture for integration tests: a fresh ledger on a temp SQLite file.
#![allow(dead_code)]

use std::sync::Arc;

use atomic_ledger::db::count_rows;
use atomic_ledger::{
    ConnectionFactory, LedgerConfig, LedgerQueries, SqliteConnectionFactory, TransactionService,
};

pub struct Ledger {
    _dir: tempfile::TempDir,
    pub factory: Arc<SqliteConnectionFactory>,
    pub service: TransactionService,
    pub queries: LedgerQueries,
}

pub fn ledger() -> Ledger {
    let dir = tempfile::tempdir().unwrap();
    let config = LedgerConfig::for_path(dir.path().join("ledger.db"));
    let factory = Arc::new(SqliteConnectionFactory::new(config.database));
    factory.initialize().unwrap();
    let service = TransactionService::new(factory.clone());
    let queries = LedgerQueries::new(factory.clone());
    Ledger { _dir: dir, factory, service, queries }
}

impl Ledger {
    /// Row counts of (`transaction`, `ledger_entry`).
    pub fn counts(&self) -> (i64, i64) {
        let conn = self.factory.connect().unwrap();
        (
            count_rows(&conn, "transaction").unwrap(),
            count_rows(&conn, "ledger_entry").unwrap(),
        )
    }

    /// Makes the store abort every insert of `entry_type` entries.
    pub fn fail_inserts(&self, entry_type: &str) {
        self.factory
            .connect()
            .unwrap()
            .execute_batch(&format!(
                "CREATE TRIGGER fail_{entry_type} BEFORE INSERT ON ledger_entry
                 WHEN NEW.entry_type = '{entry_type}'
                 BEGIN SELECT RAISE(ABORT, 'simulated store failure'); END;"
            ))
            .unwrap();
    }
}
