//! API server entry point.

use common::Money;
use sqlx::postgres::PgPoolOptions;
use store::{InMemoryStore, PostgresStore, Product};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use api::config::Config;
use api::routes::orders::Backend;

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

async fn serve<S: Backend>(store: S, backend: &'static str, config: &Config) {
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let state = api::create_state(store, backend);
    let app = api::create_app(state, metrics_handle);

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

/// Seeds a small catalog so the in-memory server is usable out of the box.
async fn seed_demo_catalog(store: &InMemoryStore) {
    let products = [
        Product::new("SKU-001", "Widget", Money::from_cents(1000), 100),
        Product::new("SKU-002", "Gadget", Money::from_cents(2500), 50),
        Product::new("SKU-003", "Gizmo", Money::from_cents(750), 200),
    ];
    for product in products {
        store.add_product(product).await;
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    match config.database_url.clone() {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&database_url)
                .await
                .expect("failed to connect to database");
            let store = PostgresStore::new(pool);
            store.run_migrations().await.expect("migrations failed");
            tracing::info!("using PostgreSQL store");
            serve(store, "postgres", &config).await;
        }
        None => {
            let store = InMemoryStore::new();
            seed_demo_catalog(&store).await;
            tracing::info!("DATABASE_URL not set, using in-memory store with demo catalog");
            serve(store, "memory", &config).await;
        }
    }
}
