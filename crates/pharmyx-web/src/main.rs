//! Pharmyx Web Server
//!
//! Run with: cargo run -p pharmyx-web --bin pharmyx-web

use std::net::SocketAddr;

use pharmyx_web::config::Config;
use pharmyx_web::router::build_router;
use pharmyx_web::state::AppState;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pharmyx_web::init_tracing();

    info!("Starting Pharmyx Web Server...");

    let config = Config::load()?;
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;

    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
