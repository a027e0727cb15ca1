//! Process configuration from command-line flags and environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

/// User management HTTP service.
#[derive(Debug, Clone, Parser)]
#[command(name = "users-api", version, about)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "USERS_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, short, env = "USERS_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Log filter used when RUST_LOG is unset (e.g. `info`, `users_api=debug`)
    #[arg(long, env = "USERS_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
