//! Small HTTP server exposing the identification API.
//!
//! The binary wires an [`Engine`] into an Axum router: register songs,
//! list them, and identify uploaded clips.

use std::sync::Arc;

use earshot::engine::{self, Engine};
use earshot::server;

/// Application entrypoint. Binds to `EARSHOT_ADDR` (default
/// `0.0.0.0:5001`) and serves routes.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let data_dir = std::env::var("EARSHOT_DATA_DIR").unwrap_or_else(|_| "./data".to_owned());
    engine::init(&data_dir)?;

    let engine = Arc::new(Engine::new());
    let app = server::router(engine);

    let addr = std::env::var("EARSHOT_ADDR").unwrap_or_else(|_| "0.0.0.0:5001".to_owned());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, %data_dir, "earshot listening");
    axum::serve(listener, app).await?;

    Ok(())
}
