//! API Server Entry Point
//!
//! Uses `anyhow` for startup errors; request-level errors are
//! `kernel::AppError`.

use std::net::SocketAddr;

use api::config::AppConfig;
use api::sweeper::SWEEP_INTERVAL;
use api::{App, build_app};
use auth::PgAuthRepository;
use auth::domain::repository::RefreshTokenRepository;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    tracing::info!(
        env = %config.env,
        port = config.port,
        payments = config.paystack.secret_key.is_some(),
        email = config.mailer.api_key.is_some(),
        storage = config.storage.is_some(),
        "Starting marketplace API"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Database unreachable"))?;
    tracing::info!("Connected to database");

    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Migrations failed"))?;
    tracing::info!("Migrations completed");

    // Errors here should not prevent server startup
    if let Err(e) = PgAuthRepository::new(pool.clone())
        .cleanup_expired_refresh_tokens()
        .await
    {
        tracing::warn!(error = %e, "Refresh token cleanup failed, continuing anyway");
    }

    let App {
        router,
        sweeper,
        presence,
    } = build_app(&config, pool.clone());
    let sweeper = sweeper.spawn(SWEEP_INTERVAL);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .inspect_err(|e| tracing::error!(error = %e, %addr, "Could not bind"))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!(
        open_sockets = presence.connections(),
        "Server stopped accepting connections"
    );
    sweeper.abort();
    pool.close().await;
    tracing::info!("Database pool closed");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
