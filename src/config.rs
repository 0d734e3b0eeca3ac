use std::net::SocketAddr;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(
    name = "stun-probe",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION")
)]
pub struct Config {
    /// server:
    ///
    /// the stun server to probe, as host:port. NAT behavior discovery
    /// (RFC 5780) needs a server with an alternate address; plain
    /// binding and RFC 3489 classification work against any stun
    /// server.
    #[clap(long)]
    #[clap(env = "STUN_PROBE_SERVER")]
    #[clap(default_value = "stun.l.google.com:19302")]
    pub server: String,
    /// bind:
    ///
    /// the local address probe sockets are bound to. the port should
    /// stay 0 so every discovery step can take a fresh ephemeral port.
    #[clap(long)]
    #[clap(env = "STUN_PROBE_BIND")]
    #[clap(default_value = "0.0.0.0:0")]
    pub bind: SocketAddr,
    /// timeout:
    ///
    /// receive window per round trip, in milliseconds. there is no
    /// retransmission, an elapsed window counts as a negative signal
    /// in the discovery trees.
    #[clap(long)]
    #[clap(env = "STUN_PROBE_TIMEOUT")]
    #[clap(default_value = "3000")]
    pub timeout: u64,
    /// listen:
    ///
    /// run as a binding server on this address instead of probing.
    #[clap(long)]
    #[clap(env = "STUN_PROBE_LISTEN")]
    pub listen: Option<SocketAddr>,
    #[clap(long)]
    #[clap(env = "STUN_PROBE_LOG_LEVEL")]
    #[clap(default_value = "info")]
    pub log_level: log::Level,
}

impl Config {
    pub fn load() -> Self {
        Self::parse()
    }
}
