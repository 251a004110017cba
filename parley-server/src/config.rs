//! Server configuration.

use clap::Parser;

/// Parley chat server.
#[derive(Debug, Parser)]
#[command(name = "parley-server", about = "Parley chat server")]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 1234)]
    pub port: u16,

    /// Maximum concurrent sessions.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=100))]
    pub max_sessions: u16,
}
