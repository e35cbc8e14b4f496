//! Tallyvane API Server
//!
//! This crate provides the HTTP server for the Tallyvane collection-count
//! publisher. It keeps one gauge per monitored collection fresh from
//! background refresh tasks and serves the results to Prometheus scrapers.
//!
//! # Architecture
//!
//! The server is built on Axum and Tokio, providing:
//! - One background refresh task per registered counter
//! - A Prometheus text exposition endpoint at `/metrics`
//! - A JSON health check at `/health`
//!
//! # Example
//!
//! ```no_run
//! use api::run_server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_server().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
pub mod db;
pub mod publisher;
mod routes;
mod state;

pub use config::Config;
pub use state::AppState;

use axum::Router;
use shared::config::default_counter_specs;
use shared::registry::GaugeRegistry;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use db::{Database, DatabaseConfig};
use publisher::CounterPublisher;

/// Creates the application router with all routes and middleware.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::metrics_routes(state))
        .layer(TraceLayer::new_for_http())
}

/// Runs the API server with configuration from the environment.
///
/// # Errors
///
/// Returns an error if configuration is invalid, if the counters cannot be
/// registered, or if the server fails to bind or serve.
pub async fn run_server() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    run_server_with_config(config).await
}

/// Runs the API server with the given configuration.
///
/// Starts the counter refresh tasks before serving, so the first scrape
/// already sees fresh counts when the database is reachable. The refresh
/// tasks are stopped once serving ends, cleanly or not.
///
/// # Errors
///
/// Returns an error if the counters cannot be registered, or if the server
/// fails to bind or serve.
pub async fn run_server_with_config(config: Config) -> anyhow::Result<()> {
    let addr = config.socket_addr();

    let registry = Arc::new(GaugeRegistry::new());

    let db_config = DatabaseConfig::from_env()?;
    let database = Database::new(&db_config);
    match database.ping().await {
        Ok(()) => tracing::info!(url = %db_config.url, "Database connection verified"),
        Err(e) => tracing::warn!(
            url = %db_config.url,
            error = %e,
            "Database unreachable at startup, counts will publish once it recovers"
        ),
    }

    let mut counter_publisher =
        CounterPublisher::new(Arc::clone(&registry), config.count_timeout())?;
    for spec in default_counter_specs() {
        let spec = spec.with_interval_ms(config.refresh_interval_ms);
        // A source interpolates its collection name into the count query,
        // so the spec must validate before one is built.
        spec.validate_spec()?;
        let source = Arc::new(database.collection_source(&spec.collection));
        counter_publisher.register(spec, source)?;
    }
    let publisher_handle = counter_publisher.start();

    let state = AppState::new(registry);
    let app = create_router(state);

    tracing::info!(address = %addr, "Starting Tallyvane API server");
    let served = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
        }
        Err(e) => Err(e),
    };

    // Refresh tasks are cancelled and joined on every exit path.
    publisher_handle.stop().await;
    served?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
