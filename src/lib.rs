pub mod config;
pub mod server;

use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use nat::{UdpBinder, rfc3489, rfc5780};

use self::config::Config;

/// In order to let integration tests start the prober without going
/// through the executable, a function is opened to replace the main
/// function.
pub async fn startup(config: Config) -> anyhow::Result<()> {
    if let Some(listen) = config.listen {
        return server::run(listen).await;
    }

    let server = resolve(&config.server).await?;
    let binder = UdpBinder::new(config.bind, Duration::from_millis(config.timeout));

    log::info!("probing server: {} ({})", config.server, server);

    let nat_type = rfc3489::discover(&binder, server).await;
    println!("nat type (rfc 3489): {}", nat_type);

    let (mapping, filtering) = rfc5780::discover(&binder, server).await;
    println!("mapping behavior (rfc 5780): {:?}", mapping);
    println!("filtering behavior (rfc 5780): {:?}", filtering);

    Ok(())
}

/// Picks the first resolved address, ipv4 before ipv6, servers rarely
/// publish alternate addresses on both families.
async fn resolve(server: &str) -> anyhow::Result<SocketAddr> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(server)
        .await
        .with_context(|| format!("failed to resolve {}", server))?
        .collect();

    addrs
        .iter()
        .find(|it| it.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .with_context(|| format!("no address for {}", server))
}
