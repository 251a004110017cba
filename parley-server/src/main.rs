use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use parley_server::config::ServerConfig;
use parley_server::{run_server, MemoryStore, ServerContext};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind");
    tracing::info!(%addr, max_sessions = config.max_sessions, "chat server listening");

    let ctx = ServerContext::new(Arc::new(MemoryStore::new()));
    run_server(listener, ctx, config.max_sessions as usize).await;
}
