// End-to-end ledger behavior against a real SQLite file.

mod common;

use atomic_ledger::{
    EntryType, LedgerConfig, LedgerError, LedgerQueries, SimpleTransactionRequest,
    TransactionService, TransactionType, TransferRequest,
};
use common::ledger;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn transfer_between_two_accounts() {
    let ledger = ledger();
    let result = ledger
        .service
        .transfer(TransferRequest::new(1, 2, dec!(100.00), "rent", 7));
    assert!(result.is_success());

    let receipt = result.data.unwrap();
    let entries = ledger.queries.list_by_transaction(receipt.transaction_id);
    assert_eq!(entries.len(), 2);

    let debit = entries.iter().find(|e| e.entry_type == EntryType::Debit).unwrap();
    let credit = entries.iter().find(|e| e.entry_type == EntryType::Credit).unwrap();
    assert_eq!((debit.account_id, debit.amount), (1, dec!(100.00)));
    assert_eq!((credit.account_id, credit.amount), (2, dec!(100.00)));
    assert_eq!(debit.id, receipt.ledger_entries.debit.id);
    assert_eq!(credit.id, receipt.ledger_entries.credit.id);
}

#[test]
fn same_account_transfer_is_rejected_without_writes() {
    let ledger = ledger();
    let result = ledger
        .service
        .transfer(TransferRequest::new(5, 5, dec!(10.00), "loop", 1));

    assert!(!result.is_success());
    assert_eq!(
        result.error.as_deref(),
        Some("source and destination accounts must differ")
    );
    assert_eq!(ledger.counts(), (0, 0));
}

#[test]
fn deposit_records_a_single_credit() {
    let ledger = ledger();
    let receipt = ledger
        .service
        .create_simple_transaction(SimpleTransactionRequest::new(
            1,
            dec!(50.00),
            EntryType::Credit,
            "cash in",
            1,
        ))
        .unwrap();

    assert_eq!(receipt.entry_type, EntryType::Credit);
    let entries = ledger.queries.list_by_transaction(receipt.transaction_id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, receipt.ledger_entry_id);
    assert_eq!(entries[0].amount, dec!(50.00));

    let tx = ledger.queries.get_transaction(receipt.transaction_id).unwrap();
    assert_eq!(tx.transaction_type, TransactionType::Withdrawal);
}

#[test]
fn negative_amount_is_rejected_without_writes() {
    let ledger = ledger();
    let result = ledger.service.simple_transaction(SimpleTransactionRequest::new(
        1,
        dec!(-5.00),
        EntryType::Debit,
        "bad",
        1,
    ));

    assert!(!result.is_success());
    assert_eq!(result.error.as_deref(), Some("amount must be greater than zero"));
    assert_eq!(ledger.counts(), (0, 0));
}

#[test]
fn failure_on_second_insert_rolls_back_everything() {
    let ledger = ledger();
    ledger.fail_inserts("credit");

    let err = ledger
        .service
        .create_transfer(TransferRequest::new(1, 2, dec!(100.00), "rent", 7))
        .unwrap_err();

    assert!(matches!(err, LedgerError::Database(_)));
    assert_eq!(ledger.counts(), (0, 0));
}

#[test]
fn failure_on_first_entry_insert_rolls_back_the_transaction_row() {
    let ledger = ledger();
    ledger.fail_inserts("debit");

    let result = ledger
        .service
        .transfer(TransferRequest::new(1, 2, dec!(100.00), "rent", 7));

    assert!(!result.is_success());
    assert_eq!(ledger.counts(), (0, 0));
}

#[test]
fn failed_simple_transaction_leaves_nothing_behind() {
    let ledger = ledger();
    ledger.fail_inserts("credit");

    let err = ledger
        .service
        .create_simple_transaction(SimpleTransactionRequest::deposit(1, dec!(50.00), "cash", 1))
        .unwrap_err();

    assert!(matches!(err, LedgerError::Database(_)));
    assert_eq!(ledger.counts(), (0, 0));
}

#[test]
fn every_transfer_balances() {
    let ledger = ledger();
    let amounts = [dec!(0.01), dec!(1), dec!(99.99), dec!(12345.678)];

    for (i, amount) in amounts.into_iter().enumerate() {
        let from = i as i64 + 1;
        let receipt = ledger
            .service
            .create_transfer(TransferRequest::new(from, from + 10, amount, "batch", 1))
            .unwrap();

        let entries = ledger.queries.list_by_transaction(receipt.transaction_id);
        assert_eq!(entries.len(), 2);
        let net: Decimal = entries.iter().map(|e| e.signed_amount()).sum();
        assert_eq!(net, Decimal::ZERO);
        assert!(entries.iter().all(|e| e.amount == amount));
    }
}

#[test]
fn simple_transactions_write_exactly_one_entry() {
    let ledger = ledger();
    let deposit = ledger
        .service
        .create_simple_transaction(SimpleTransactionRequest::deposit(3, dec!(20), "in", 1))
        .unwrap();
    let withdrawal = ledger
        .service
        .create_simple_transaction(SimpleTransactionRequest::withdrawal(3, dec!(5), "out", 1))
        .unwrap();

    for (receipt, kind) in [(deposit, EntryType::Credit), (withdrawal, EntryType::Debit)] {
        let entries = ledger.queries.list_by_transaction(receipt.transaction_id);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_type, kind);
        assert_eq!(entries[0].account_id, 3);
    }
    assert_eq!(ledger.counts(), (2, 2));
}

#[test]
fn identifiers_increase_across_calls() {
    let ledger = ledger();
    let first = ledger
        .service
        .create_transfer(TransferRequest::new(1, 2, dec!(1), "a", 1))
        .unwrap();
    let second = ledger
        .service
        .create_simple_transaction(SimpleTransactionRequest::deposit(1, dec!(1), "b", 1))
        .unwrap();
    let third = ledger
        .service
        .create_transfer(TransferRequest::new(2, 1, dec!(1), "c", 1))
        .unwrap();

    assert!(first.transaction_id < second.transaction_id);
    assert!(second.transaction_id < third.transaction_id);
    assert!(first.ledger_entries.debit.id < first.ledger_entries.credit.id);
    assert!(first.ledger_entries.credit.id < second.ledger_entry_id);
    assert!(second.ledger_entry_id < third.ledger_entries.debit.id);
}

#[test]
fn reads_are_repeatable() {
    let ledger = ledger();
    let receipt = ledger
        .service
        .create_transfer(TransferRequest::new(1, 2, dec!(42), "x", 1))
        .unwrap();

    let first = ledger.queries.list_by_transaction(receipt.transaction_id);
    let second = ledger.queries.list_by_transaction(receipt.transaction_id);
    assert_eq!(first, second);
    assert_eq!(
        ledger.queries.get_by_id(receipt.ledger_entries.debit.id),
        ledger.queries.get_by_id(receipt.ledger_entries.debit.id)
    );
}

#[test]
fn reads_of_unknown_ids_are_empty() {
    let ledger = ledger();
    assert!(ledger.queries.list_by_transaction(404).is_empty());
    assert!(ledger.queries.get_by_id(404).is_none());
    assert!(ledger.queries.transaction_detail(404).is_none());
}

#[test]
fn unreachable_store_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let config = LedgerConfig::for_path(dir.path().join("missing").join("ledger.db"));
    let service = TransactionService::from_config(&config);
    let queries = LedgerQueries::new(service.factory());

    let result = service.transfer(TransferRequest::new(1, 2, dec!(1), "x", 1));
    assert!(!result.is_success());
    assert_eq!(result.code, Some("STORE_UNAVAILABLE"));
    assert!(queries.list_by_transaction(1).is_empty());
}
