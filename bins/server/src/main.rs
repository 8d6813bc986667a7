//! Kopa API Server
//!
//! Main entry point for the loan origination service.

use std::sync::Arc;

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use kopa_accounting::AccountingClient;
use kopa_api::{AppState, create_router};
use kopa_core::loan::{ActivityLogHook, HookChain};
use kopa_db::{connect, migration::Migrator};
use kopa_shared::AppConfig;
use kopa_shared::config::{LogConfig, LogFormat};

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kopa=debug,tower_http=debug".into());

    match log.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log);

    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!(max_connections = config.database.max_connections, "Connected to database");

    if config.database.run_migrations {
        Migrator::up(&db, None)
            .await
            .context("Failed to apply migrations")?;
        info!("Migrations applied");
    }

    let accounting = AccountingClient::new(&config.accounting)
        .context("Failed to build accounting client")?;
    info!(base_url = %config.accounting.base_url, "Accounting client configured");

    let hooks = HookChain::new().with(Arc::new(ActivityLogHook));
    let state = AppState::new(db, accounting, hooks);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
