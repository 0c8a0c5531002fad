// ⚙️ Ledger configuration
// Loaded from `config/default.toml`, `config/{RUN_MODE}.toml` and the
// environment (`LEDGER__DATABASE__PATH=...`), in that order. A `.env` file is
// read first when present.

use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration handed to the connection factory and orchestrator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub accounts: AccountPolicy,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where the SQLite ledger lives and how connections are opened.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// How long a writer waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Switch the database to WAL journaling when the schema is set up.
    #[serde(default = "default_wal")]
    pub wal: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("ledger.db")
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_wal() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            wal: default_wal(),
        }
    }
}

/// Which account checks run inside the write scope before any insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountPolicy {
    /// Account ids are written as given.
    #[default]
    Unchecked,
    /// Every referenced account must exist in the `account` table.
    RequireExisting,
    /// Like `RequireExisting`, and the debited account must belong to the actor.
    RequireOwnership,
}

/// HTTP listener settings (used by `ledger-server`).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl LedgerConfig {
    /// Loads configuration from files and `LEDGER__*` environment variables.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("LEDGER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Default configuration pointed at a specific database file.
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        Self {
            database: DatabaseConfig {
                path: path.as_ref().to_path_buf(),
                ..DatabaseConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn with_account_policy(mut self, policy: AccountPolicy) -> Self {
        self.accounts = policy;
        self
    }
}
