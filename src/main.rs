// Netta top-list server

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use netta_toplists::{
    app_state::AppState,
    config::Config,
    feed_interface::create_feed_router,
    infrastructure::monitoring::initialize_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    initialize_tracing()?;

    let config = Config::from_env()?;
    let app_state = AppState::new(config.clone()).await?;

    // Warm the cache so the first request does not pay for the computation
    if let Err(err) = app_state.feed.top_lists().await {
        tracing::warn!("Initial top-list computation failed: {}", err);
    }

    let app = Router::new()
        .nest("/api/v1", create_feed_router(app_state.feed.clone()))
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = config.server_address().parse()?;
    info!("Netta top-list server starting on http://{}", addr);
    info!("  GET  /api/v1/toplists           - cached top lists");
    info!("  GET  /api/v1/users/{{handle}}     - profile with fresh stats");
    info!("  POST /api/v1/posts              - create post");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
