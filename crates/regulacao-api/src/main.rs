mod routes;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use regulacao_core::db;
use state::AppState;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    dotenvy::dotenv().ok();
    let database_url =
        db::database_url_from_env().context("connection string missing; refusing to start")?;
    let pool = db::connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    let app_state = Arc::new(AppState::new(pool));

    let router = Router::new()
        .route("/dashboard", get(routes::dashboard))
        .route("/refresh", post(routes::refresh))
        .with_state(app_state);

    let listener = TcpListener::bind((std::net::Ipv4Addr::UNSPECIFIED, 3000)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}
