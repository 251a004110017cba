//! Parley chat server.
//!
//! Accepts concurrent TCP connections up to a hard admission cap, drives
//! each through the authentication state machine, and routes broadcast
//! and whisper traffic through the shared registry. Out-of-band producers
//! (announcement bots) broadcast through [`ServerContext::router`].

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;

pub mod config;
pub mod error;
pub mod registry;
pub mod router;
pub mod session;
pub mod store;
pub mod wire;

pub use error::ServerError;
pub use registry::Registry;
pub use router::Router;
pub use session::Session;
pub use store::{ChatStore, MemoryStore};

/// Process-wide server state: registry, router and store, constructed at
/// startup and shared by every session task. Owned and lifecycle-scoped;
/// there are no ambient globals.
pub struct ServerContext {
    /// The live-connection directory.
    pub registry: Arc<Registry>,
    /// Broadcast/whisper routing over the registry and store.
    pub router: Arc<Router>,
    /// The durable store.
    pub store: Arc<dyn ChatStore>,
}

impl ServerContext {
    /// Build the context around a store implementation.
    pub fn new(store: Arc<dyn ChatStore>) -> Arc<Self> {
        let registry = Arc::new(Registry::new());
        let router = Arc::new(Router::new(registry.clone(), store.clone()));
        Arc::new(Self {
            registry,
            router,
            store,
        })
    }
}

/// Accept connections until the listener fails.
///
/// Admission is a hard cap, not a queue: a semaphore permit is taken
/// before `accept`, so at capacity the listener simply stops accepting
/// until a session tears down and releases its permit. Transient ids
/// come from a monotonic counter and are never reused.
pub async fn run_server(listener: TcpListener, ctx: Arc<ServerContext>, max_sessions: usize) {
    let permits = Arc::new(Semaphore::new(max_sessions));
    let mut next_id: u64 = 0;

    loop {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let Ok((stream, peer_addr)) = listener.accept().await else {
            break;
        };

        next_id += 1;
        let id = next_id;
        tracing::info!(%peer_addr, id, "accepted connection");

        let ctx = ctx.clone();
        tokio::spawn(async move {
            // Permit travels with the session; capacity frees on teardown.
            let _permit = permit;
            Session::new(id, stream, ctx).run().await;
        });
    }
}
