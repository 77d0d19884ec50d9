//! API server entry point.

use std::sync::Arc;

use api::auth::{Authenticator, StaticTokenAuthenticator};
use api::config::{Config, LogFormat};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemoryStore, Money, PostgresStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Catalog for running without a database.
async fn seed_demo_catalog(store: &InMemoryStore) {
    for (name, cents) in [
        ("Whole Milk 1L", 6_500),
        ("Brown Bread", 4_500),
        ("Free Range Eggs (12)", 9_900),
        ("Basmati Rice 5kg", 52_000),
    ] {
        store.insert_product(name, Money::from_cents(cents)).await;
    }
}

async fn build_app(
    config: &Config,
    authenticator: Arc<dyn Authenticator>,
    metrics_handle: PrometheusHandle,
) -> Router {
    match &config.database_url {
        Some(url) => {
            let store = PostgresStore::connect(url, config.db_max_connections)
                .await
                .expect("failed to connect to database");
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!(max_connections = config.db_max_connections, "using PostgreSQL store");
            let state = api::create_state(store, authenticator, config.order_number_attempts);
            api::create_app(state, metrics_handle)
        }
        None => {
            let store = InMemoryStore::new();
            seed_demo_catalog(&store).await;
            tracing::warn!("DATABASE_URL not set, using in-memory store with a demo catalog");
            let state = api::create_state(store, authenticator, config.order_number_attempts);
            api::create_app(state, metrics_handle)
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Load the token table
    let authenticator =
        StaticTokenAuthenticator::parse(&config.api_tokens).expect("invalid API_TOKENS");
    if authenticator.is_empty() {
        tracing::warn!("API_TOKENS is empty, every authenticated route will return 401");
    }

    // 4. Build the application over the configured store
    let app = build_app(&config, Arc::new(authenticator), metrics_handle).await;

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
