//! Feastride Backend Service
//!
//! Main entry point for the Feastride marketplace backend.
//! This service provides:
//! - REST API for customers, restaurants, drivers and riders
//! - Background sweep of expired login codes

use feastride_backend::database::{create_pool, run_migrations};
use feastride_backend::{router, AppConfig, AppError, AppResult, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

const OTP_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "feastride_backend={},sqlx=warn,tower_http=info",
            config.log_level
        )
        .into()
    });

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received, shutting down gracefully...");
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    init_tracing(&config);

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Feastride Backend Service Starting             ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!("HTTP port: {}", config.http_port);
    if config.auth.otp_echo {
        warn!("OTP_ECHO is on: login codes are returned in responses");
    }

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    info!("Connecting to database...");

    let pool = create_pool(&config.database).await.map_err(|e| {
        error!("Failed to create database pool: {}", e);
        AppError::Database(e)
    })?;

    info!("Database connection pool created successfully");
    info!("Max connections: {}", config.database.max_connections);

    info!("Running database migrations...");
    run_migrations(&pool).await.map_err(|e| {
        error!("Database migration failed: {}", e);
        AppError::Database(e)
    })?;

    info!("Database migrations completed successfully");

    // =========================================================================
    // SERVICES
    // =========================================================================
    let app_state = Arc::new(AppState::new(pool, &config));
    info!("✓ Application state initialized");

    let otp_repo = app_state.otp_repo.clone();
    let sweeper_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(OTP_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match otp_repo.purge_expired().await {
                Ok(0) => {}
                Ok(n) => info!("Purged {} expired login codes", n),
                Err(e) => warn!("Failed to purge expired login codes: {}", e),
            }
        }
    });
    info!("✓ Login code sweeper started ({}s interval)", OTP_SWEEP_INTERVAL.as_secs());

    // =========================================================================
    // START SERVER
    // =========================================================================
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Message(format!("Failed to bind HTTP server: {}", e)))?;

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Feastride Backend Service Ready!               ║");
    info!("╠══════════════════════════════════════════════════════════╣");
    info!("║  REST API:     {}", addr);
    info!("║  Environment:  {}", config.environment);
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Press Ctrl+C to shutdown gracefully");

    let result = axum::serve(listener, router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper_handle.abort();

    result.map_err(|e| {
        error!("HTTP server error: {}", e);
        AppError::Message(format!("HTTP server error: {}", e))
    })?;

    info!("Feastride backend service shutdown complete");
    Ok(())
}
