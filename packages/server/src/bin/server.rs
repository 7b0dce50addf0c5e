//! Broadcast relay server for peer-support chat.
//!
//! Relays every text message from a connected peer to all connected peers.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin solace-server -- --port 8080
//! ```

use clap::Parser;
use solace_server::ServerConfig;
use solace_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Run the server
    if let Err(e) = solace_server::run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
