use std::{io, net::SocketAddr, time::Duration};

use tokio::net::UdpSocket;

/// Receive window for a single round trip. Discovery treats an elapsed
/// window as a negative signal, so this is also the per-test cost of a
/// filtered path.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// A datagram endpoint a discovery round trip runs over.
///
/// An elapsed receive window must surface as
/// [`io::ErrorKind::TimedOut`]; the decision trees key on it.
pub trait Transport {
    fn local_addr(&self) -> io::Result<SocketAddr>;

    fn send_to(&mut self, bytes: &[u8], target: SocketAddr) -> impl Future<Output = io::Result<()>>;

    fn recv_from(&mut self, bytes: &mut [u8])
    -> impl Future<Output = io::Result<(usize, SocketAddr)>>;
}

/// Opens fresh transports. Discovery steps that must observe a new NAT
/// mapping bind a new local socket through this instead of reusing the
/// previous one.
pub trait Binder {
    type Transport: Transport;

    fn bind(&self) -> impl Future<Output = io::Result<Self::Transport>>;
}

pub struct UdpTransport {
    socket: UdpSocket,
    local: SocketAddr,
    timeout: Duration,
}

impl Transport for UdpTransport {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.local)
    }

    async fn send_to(&mut self, bytes: &[u8], target: SocketAddr) -> io::Result<()> {
        // an unspecified bind address says nothing about the interface
        // datagrams actually leave from, and the no-NAT test compares
        // the local address against the mapped one. A connected
        // throwaway socket resolves the outbound address toward this
        // target once; the port stays the real socket's.
        if self.local.ip().is_unspecified() {
            let probe = UdpSocket::bind(SocketAddr::new(self.local.ip(), 0)).await?;
            probe.connect(target).await?;
            self.local.set_ip(probe.local_addr()?.ip());
        }

        self.socket.send_to(bytes, target).await?;
        Ok(())
    }

    async fn recv_from(&mut self, bytes: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        match tokio::time::timeout(self.timeout, self.socket.recv_from(bytes)).await {
            Ok(it) => it,
            Err(_) => Err(io::ErrorKind::TimedOut.into()),
        }
    }
}

/// Binds unspecified-address UDP sockets with an ephemeral port, one
/// per call.
pub struct UdpBinder {
    bind: SocketAddr,
    timeout: Duration,
}

impl Default for UdpBinder {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 0)),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl UdpBinder {
    pub fn new(bind: SocketAddr, timeout: Duration) -> Self {
        Self { bind, timeout }
    }
}

impl Binder for UdpBinder {
    type Transport = UdpTransport;

    async fn bind(&self) -> io::Result<UdpTransport> {
        let socket = UdpSocket::bind(self.bind).await?;
        let local = socket.local_addr()?;

        Ok(UdpTransport {
            socket,
            local,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unspecified_bind_resolves_outbound_ip() -> io::Result<()> {
        let peer = UdpSocket::bind("127.0.0.1:0").await?;
        let target = peer.local_addr()?;

        let mut transport = UdpBinder::default().bind().await?;
        let bound = transport.local_addr()?;
        assert!(bound.ip().is_unspecified());

        transport.send_to(b"ping", target).await?;

        // the ip is now the loopback interface, the port is unchanged.
        let local = transport.local_addr()?;
        assert_eq!(local.ip(), target.ip());
        assert_eq!(local.port(), bound.port());

        Ok(())
    }
}
