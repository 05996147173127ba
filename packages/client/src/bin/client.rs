//! Terminal client for the broadcast relay.
//!
//! Connects to the relay and sends every line typed at the prompt. Messages
//! from other clients and join/leave notices are printed as they arrive.
//! Reconnects automatically when the connection drops.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin relay-client
//! cargo run --bin relay-client -- --url ws://127.0.0.1:12345/ws
//! ```

use std::time::Duration;

use clap::Parser;

use relay_client::{
    ReconnectPolicy,
    runner::{DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL_SECS},
};
use relay_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "relay-client")]
#[command(about = "Terminal client for the WebSocket broadcast relay", long_about = None)]
struct Args {
    /// WebSocket URL of the relay
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:12345/ws")]
    url: String,

    /// Consecutive failed connection attempts before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_RECONNECT_ATTEMPTS)]
    max_reconnect_attempts: u32,

    /// Seconds to wait between connection attempts
    #[arg(long, default_value_t = DEFAULT_RECONNECT_INTERVAL_SECS)]
    reconnect_interval: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_PKG_NAME"), env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let policy = ReconnectPolicy {
        max_attempts: args.max_reconnect_attempts,
        interval: Duration::from_secs(args.reconnect_interval),
    };

    if let Err(e) = relay_client::run_client(args.url, policy).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
