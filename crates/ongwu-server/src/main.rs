//! Ongwu Note server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use ongwu_db::{MemoryStore, OngwuStore, PostgresStore};
use ongwu_server::metrics::init_metrics;
use ongwu_server::{AppState, run_server};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Get server configuration from environment
    let host = std::env::var("ONGWU_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("ONGWU_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .expect("ONGWU_PORT must be a valid port number");

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Invalid address");

    let jwt_secret =
        std::env::var("ONGWU_JWT_SECRET").expect("ONGWU_JWT_SECRET environment variable is required");

    tracing::info!("Starting Ongwu Note Server v{}", env!("CARGO_PKG_VERSION"));

    // Pick the storage backend
    let store: Arc<dyn OngwuStore> = match std::env::var("ONGWU_STORE").as_deref() {
        Ok("memory") => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        _ => {
            let database_url = std::env::var("DATABASE_URL")
                .expect("DATABASE_URL environment variable is required");

            tracing::info!("Connecting to PostgreSQL...");
            let store = PostgresStore::connect(&database_url)
                .await
                .expect("Failed to connect to PostgreSQL");

            store
                .migrate()
                .await
                .expect("Failed to run database migrations");

            Arc::new(store)
        }
    };

    let prometheus_handle = init_metrics();
    let state = AppState::new(store, &jwt_secret);

    run_server(addr, state, prometheus_handle).await?;

    Ok(())
}
