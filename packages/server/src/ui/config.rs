//! Server configuration from command-line flags.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroUsize,
};

use clap::Parser;

/// Default listen port of the reference deployment
pub const DEFAULT_PORT: u16 = 8080;

/// Default bound of each connection's outbound queue
pub const DEFAULT_OUTBOUND_CAPACITY: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// solace-server — broadcast relay for peer-support chat
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "solace-server", version, about = "Broadcast relay for peer-support chat")]
pub struct ServerConfig {
    /// Listen address
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Listen port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Messages queued per connection before a slow peer is disconnected (at least 1)
    #[arg(long, default_value_t = DEFAULT_OUTBOUND_CAPACITY)]
    pub outbound_capacity: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "debug")]
    pub log_level: String,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            log_level: "debug".to_string(),
        }
    }
}
