//! safiri_server — USSD crop-transport service.
//!
//! See [`safiri_server::config`] for the environment variables read at startup.

use std::sync::Arc;

use anyhow::Context;
use safiri_core::memory::{Catalog, MemoryStore};
use safiri_core::ports::{OrderStore, ReferenceData};
use safiri_core::UssdService;
use safiri_server::config::{ServerConfig, StoreBackend};
use safiri_server::router::build_router;
use tokio::net::TcpListener;

type Stores = (Arc<dyn ReferenceData>, Arc<dyn OrderStore>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,safiri_server=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        store = ?config.store,
        min_quantity = config.settings.min_quantity,
        max_quantity = config.settings.max_quantity,
        "configuration loaded"
    );

    let (reference, orders) = match config.store {
        StoreBackend::Memory => memory_stores(),
        StoreBackend::Postgres => postgres_stores(&config).await?,
    };

    let service = Arc::new(UssdService::new(
        reference,
        Arc::clone(&orders),
        config.settings.clone(),
    ));
    let app = build_router(service, orders);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!("safiri_server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn memory_stores() -> Stores {
    tracing::warn!("using in-memory store with demo catalogue; orders are not persisted");
    let store = Arc::new(MemoryStore::new(Catalog::demo()));
    let reference: Arc<dyn ReferenceData> = store.clone();
    let orders: Arc<dyn OrderStore> = store;
    (reference, orders)
}

#[cfg(feature = "postgres")]
async fn postgres_stores(config: &ServerConfig) -> anyhow::Result<Stores> {
    use safiri_postgres::PgStores;
    use sqlx::postgres::PgPoolOptions;

    let database_url = config
        .database_url
        .as_deref()
        .context("database url not configured")?;
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to database")?;
    tracing::info!("Connected to database");

    let stores = PgStores::new(pool);
    Ok((Arc::new(stores.reference), Arc::new(stores.orders)))
}

#[cfg(not(feature = "postgres"))]
async fn postgres_stores(_config: &ServerConfig) -> anyhow::Result<Stores> {
    anyhow::bail!("SAFIRI_STORE=postgres but safiri_server was built without the `postgres` feature")
}
