//! Bolsa API Server
//!
//! Main entry point for the bolsa ledger service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bolsa_api::{AppState, create_router};
use bolsa_core::fund::FundService;
use bolsa_db::{CertificateRepository, LedgerRepository, RechargeRepository, connect};
use bolsa_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bolsa=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to database
    let db = connect(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    // Wire the fund service over PostgreSQL
    let fund = FundService::from_config(
        &config,
        Arc::new(LedgerRepository::new(db.clone())),
        Arc::new(RechargeRepository::new(db.clone())),
        Arc::new(CertificateRepository::new(db)),
    )
    .context("Invalid tariff configuration")?;

    for (tier, tariff) in fund.resolver().iter() {
        info!(%tier, base_value = %tariff.base_value, total = %tariff.total(), "Tariff loaded");
    }
    info!(max_attempts = config.ledger.max_attempts, "Balance engine configured");

    // Create router
    let app = create_router(AppState::new(fund));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
