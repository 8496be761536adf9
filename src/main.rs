// Revolution Archive - API Server

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use revolution_archive::{api, db, Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let conn = Connection::open(&config.database_path)
        .with_context(|| format!("failed to open database {:?}", config.database_path))?;
    db::setup_database(&conn)?;
    tracing::info!(path = %config.database_path.display(), "database ready");

    let addr = config.bind_addr.clone();
    let state = api::AppState::new(conn, config);
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).await.context("server exited")?;

    Ok(())
}
