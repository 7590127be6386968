//! Router assembly for the earshot service.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::engine::Engine;
use crate::routes;

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/songs", get(routes::list_songs).post(routes::add_song))
        .route("/identify", post(routes::identify))
        .route("/health", get(|| async { "healthy" }))
        .with_state(engine)
}
