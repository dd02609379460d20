use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use portal_api::app::{self, AppState};
use portal_api::auth::{AuthGate, JwtKeys};
use portal_api::config::AppConfig;
use portal_api::database::{Database, PgPrincipalStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        "Starting Portal API in {:?} mode (gate: {:?})",
        config.environment,
        config.security.gate_mode
    );

    let database = if config.database.url.is_some() {
        Some(Database::connect(&config.database).await?)
    } else {
        None
    };

    let keys = JwtKeys::new(&config.security.jwt_secret)?;
    let mut gate = AuthGate::builder(keys, config.security.gate_mode)
        .attach_contacts(config.security.attach_contacts);
    if let Some(database) = &database {
        gate = gate.store(Arc::new(PgPrincipalStore::new(database.pool().clone())));
    }
    let gate = gate
        .build()
        .context("DATABASE_URL is required when SECURITY_GATE_MODE=store")?;

    let mut state = AppState::new(gate);
    if let Some(database) = database {
        state = state.with_database(database);
    }

    let app = app::router(state, &config.security.cors_origins);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Portal API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}
