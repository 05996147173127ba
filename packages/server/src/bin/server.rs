//! Broadcast relay server.
//!
//! Every message a client sends is broadcast to all other connected clients.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin relay-server
//! cargo run --bin relay-server -- --host 127.0.0.1 --port 12345 --outbound-capacity 64
//! cargo run --bin relay-server -- --close-grace-secs 2
//! ```

use std::time::Duration;

use clap::Parser;

use relay_server::{
    config::{
        DEFAULT_CLOSE_GRACE, DEFAULT_HOST, DEFAULT_HUB_CAPACITY, DEFAULT_OUTBOUND_CAPACITY,
        DEFAULT_PORT, RelayConfig,
    },
    ui::Server,
};
use relay_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "relay-server")]
#[command(about = "WebSocket broadcast relay server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Frames a connection may have queued before it is dropped as too slow
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_CAPACITY)]
    outbound_capacity: usize,

    /// Commands that may wait for the hub before senders are held back
    #[arg(long, default_value_t = DEFAULT_HUB_CAPACITY)]
    hub_capacity: usize,

    /// Seconds a closing connection gets to send its close frame
    #[arg(long, default_value_t = DEFAULT_CLOSE_GRACE.as_secs())]
    close_grace_secs: u64,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            outbound_capacity: args.outbound_capacity,
            hub_capacity: args.hub_capacity,
            close_grace: Duration::from_secs(args.close_grace_secs),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_PKG_NAME"), env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    if let Err(e) = Server::new(args.into()).run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
