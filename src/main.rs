use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atomic_ledger::batch;
use atomic_ledger::db::count_rows;
use atomic_ledger::{
    ConnectionFactory, EntryType, LedgerConfig, LedgerQueries, OperationResult,
    SimpleTransactionRequest, SqliteConnectionFactory, TransactionService, TransactionStatus,
    TransactionType, TransferRequest,
};

/// Atomic double-entry ledger
#[derive(Parser)]
#[command(name = "atomic-ledger", version)]
#[command(about = "Record transfers, deposits and withdrawals atomically", long_about = None)]
struct Cli {
    /// SQLite database file (overrides LEDGER__DATABASE__PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the ledger schema if it does not exist
    Init,
    /// Move money between two accounts (one debit, one credit)
    Transfer {
        #[arg(long)]
        from: i64,
        #[arg(long)]
        to: i64,
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        actor: i64,
        #[arg(long, default_value_t = 1)]
        type_id: i64,
        #[arg(long, default_value_t = 1)]
        status_id: i64,
    },
    /// Record a single debit or credit against one account
    Simple {
        #[arg(long)]
        account: i64,
        #[arg(long)]
        amount: Decimal,
        /// Exactly `debit` or `credit`
        #[arg(long)]
        entry_type: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        actor: i64,
        #[arg(long, default_value_t = 2)]
        type_id: i64,
        #[arg(long, default_value_t = 1)]
        status_id: i64,
    },
    /// Credit an account (deposit)
    Deposit {
        #[arg(long)]
        account: i64,
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        actor: i64,
    },
    /// Debit an account (withdrawal)
    Withdraw {
        #[arg(long)]
        account: i64,
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        actor: i64,
    },
    /// List the ledger entries of a transaction
    Entries { transaction_id: i64 },
    /// Show a single ledger entry
    Entry { entry_id: i64 },
    /// Show a transaction with its entries
    Show { transaction_id: i64 },
    /// Run every operation of a CSV file, each as its own atomic unit
    Import { csv: PathBuf },
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atomic_ledger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {e:#}");
            process::exit(2);
        }
    }
}

/// Returns `Ok(false)` when the requested ledger operation was rejected.
fn run() -> Result<bool> {
    let cli = Cli::parse();

    let mut config = LedgerConfig::load().context("Failed to load configuration")?;
    if let Some(path) = cli.db {
        config.database.path = path;
    }

    let factory = SqliteConnectionFactory::new(config.database.clone());
    factory
        .initialize()
        .with_context(|| format!("Failed to open ledger at {}", config.database.path.display()))?;

    let service = TransactionService::from_config(&config);
    let queries = LedgerQueries::new(service.factory());

    match cli.command {
        Commands::Init => {
            let conn = factory.connect()?;
            info!(path = %config.database.path.display(), "ledger schema ready");
            print_json(&serde_json::json!({
                "success": true,
                "path": config.database.path,
                "transactions": count_rows(&conn, "transaction")?,
                "ledger_entries": count_rows(&conn, "ledger_entry")?,
            }))?;
            Ok(true)
        }

        Commands::Transfer { from, to, amount, description, actor, type_id, status_id } => {
            let request = TransactionType::from_id(type_id)
                .and_then(|kind| Ok((kind, TransactionStatus::from_id(status_id)?)))
                .map(|(kind, status)| {
                    TransferRequest::new(from, to, amount, description, actor)
                        .with_type(kind)
                        .with_status(status)
                });
            let result: OperationResult<_> = match request {
                Ok(request) => service.transfer(request),
                Err(e) => OperationResult::failure(&e),
            };
            emit(&result)
        }

        Commands::Simple { account, amount, entry_type, description, actor, type_id, status_id } => {
            let request = entry_type.parse::<EntryType>().and_then(|entry_type| {
                Ok(SimpleTransactionRequest::new(account, amount, entry_type, description, actor)
                    .with_type(TransactionType::from_id(type_id)?)
                    .with_status(TransactionStatus::from_id(status_id)?))
            });
            let result: OperationResult<_> = match request {
                Ok(request) => service.simple_transaction(request),
                Err(e) => OperationResult::failure(&e),
            };
            emit(&result)
        }

        Commands::Deposit { account, amount, description, actor } => emit(
            &service.simple_transaction(SimpleTransactionRequest::deposit(
                account, amount, description, actor,
            )),
        ),

        Commands::Withdraw { account, amount, description, actor } => emit(
            &service.simple_transaction(SimpleTransactionRequest::withdrawal(
                account, amount, description, actor,
            )),
        ),

        Commands::Entries { transaction_id } => {
            print_json(&queries.list_by_transaction(transaction_id))?;
            Ok(true)
        }

        Commands::Entry { entry_id } => {
            let entry = queries.get_by_id(entry_id);
            print_json(&entry)?;
            Ok(entry.is_some())
        }

        Commands::Show { transaction_id } => {
            let detail = queries.transaction_detail(transaction_id);
            print_json(&detail)?;
            Ok(detail.is_some())
        }

        Commands::Import { csv } => {
            let report = batch::import_path(&service, &csv)
                .with_context(|| format!("Failed to import {}", csv.display()))?;
            print_json(&report)?;
            Ok(report.failed == 0)
        }
    }
}

fn emit<T: Serialize>(result: &OperationResult<T>) -> Result<bool> {
    print_json(result)?;
    Ok(result.success)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
