use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod models;
mod reports;
mod routes;
mod store;

use config::Config;
use store::{PgStore, SharedStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    if config.run_migrations {
        tracing::info!("Applying database migrations");
        sqlx::migrate!().run(&pool).await?;
    }

    let store: SharedStore = Arc::new(PgStore::new(pool));
    let app = routes::app(store, config.cors_origin.as_deref())?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🧠 Reports server running at {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
