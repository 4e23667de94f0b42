//! Book Catalog Server
//!
//! Serves the library catalog pages on top of a hosted data API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use book_catalog::{
    api,
    config::{AppConfig, StoreBackend},
    repository::{BookStore, MemoryBookStore, RestBookStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("book_catalog={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Book Catalog v{}", env!("CARGO_PKG_VERSION"));

    if config.uses_default_secret() {
        tracing::warn!("SESSION_SECRET is not set; flash cookies are signed with the insecure default");
    }

    // A missing client is not fatal: catalog routes answer 500 until restart
    let store: Option<Arc<dyn BookStore>> = match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory book store; rows are lost on restart");
            Some(Arc::new(MemoryBookStore::new()))
        }
        StoreBackend::Rest => match RestBookStore::new(&config.store) {
            Ok(store) => {
                tracing::info!("Book store client ready at {}", store.endpoint());
                Some(Arc::new(store))
            }
            Err(e) => {
                tracing::error!("Failed to initialize book store client: {}", e);
                None
            }
        },
    };

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState::new(config, store);
    let app = api::router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
