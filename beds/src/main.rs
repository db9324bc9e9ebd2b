//! Bed service HTTP server.
//!
//! ```bash
//! pocketcare-beds                        # serve
//! pocketcare-beds issue-token hospital_1 # mint a bearer token for local testing
//! ```

use anyhow::Context;
use axum::http::HeaderValue;
use metrics_exporter_prometheus::PrometheusBuilder;
use pocketcare_beds::{
    build_router, config::Config, metrics::register_bed_metrics, AppState, Identity,
    PostgresBedStore, TokenKeys,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err).context("Failed to read .env file");
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pocketcare_beds=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;
    let keys = TokenKeys::new(&config.auth.jwt_secret);

    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("issue-token") {
        let subject = args.next().context("usage: pocketcare-beds issue-token <subject>")?;
        return issue_token(&keys, &subject, &config);
    }

    info!("Starting PocketCare bed service");
    info!(
        server = %config.server_address(),
        metrics = %config.metrics_address(),
        max_connections = config.database.max_connections,
        "Configuration loaded"
    );

    // Initialize Prometheus metrics exporter
    let metrics_addr: SocketAddr = config
        .metrics_address()
        .parse()
        .context("Invalid metrics address")?;
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    register_bed_metrics();
    info!(address = %metrics_addr, "Metrics exporter listening");

    // Create database connection pool
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout))
        .idle_timeout(Some(Duration::from_secs(config.database.idle_timeout)))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Database connected");

    let store = PostgresBedStore::new(pool);
    if config.database.run_migrations {
        info!("Running database migrations...");
        store.migrate().await?;
        info!("Migrations complete");
    }

    // Build application state and router
    let state = AppState::new(Arc::new(store), keys);
    let app = build_router(state)
        .layer(cors_layer(&config.server.cors_origins))
        .layer(TraceLayer::new_for_http());

    let addr = config.server_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(address = %addr, "Server listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Print a signed token for `subject` (`user_7`, `hospital_3`, `12`).
fn issue_token(keys: &TokenKeys, subject: &str, config: &Config) -> anyhow::Result<()> {
    let identity = Identity::parse(subject)?;
    let ttl = i64::try_from(config.auth.token_ttl).unwrap_or(i64::MAX);
    let token = keys.issue(identity, chrono::Duration::seconds(ttl))?;
    println!("{token}");
    Ok(())
}

/// Any origin when none are configured, otherwise only the listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
