// Atomic Ledger - Web Server
// REST API over the ledger with Axum

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atomic_ledger::api::{create_router, AppState};
use atomic_ledger::{LedgerConfig, SqliteConnectionFactory, TransactionService};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atomic_ledger=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🌐 Atomic Ledger - Web Server v{}", atomic_ledger::VERSION);

    let config = LedgerConfig::load().context("Failed to load configuration")?;

    SqliteConnectionFactory::new(config.database.clone())
        .initialize()
        .with_context(|| format!("Failed to open ledger at {}", config.database.path.display()))?;
    info!(path = %config.database.path.display(), "✓ Database ready");

    let service = TransactionService::from_config(&config);
    let app = create_router(AppState::new(service));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("🚀 Server running on http://{addr}");
    info!("   API: http://{addr}/api/health");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
