use std::{
    collections::VecDeque,
    io,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use bytes::BytesMut;
use codec::{
    Attributes,
    message::{
        Message, MessageEncoder,
        attributes::{ChangeRequest, MappedAddress, OtherAddress, XorMappedAddress},
        methods::{BINDING_REQUEST, BINDING_RESPONSE},
    },
};
use stun_probe_nat::{
    Binder, Transport, UdpBinder,
    rfc3489::{self, NatType},
    rfc5780::{self, FilteringBehavior, MappingBehavior},
};
use tokio::net::UdpSocket;

const SERVER: &str = "203.0.113.10:3478";
const OTHER: &str = "203.0.113.11:3479";

/// What one scripted server sees of a probe.
struct Probe {
    /// index of the local socket the probe left from, in bind order.
    socket: usize,
    local: SocketAddr,
    target: SocketAddr,
    change_ip: bool,
    change_port: bool,
}

/// How the scripted server answers, None means the probe (or its
/// response) is dropped.
struct Answer {
    mapped: SocketAddr,
    other: Option<SocketAddr>,
}

type Script = Arc<dyn Fn(&Probe) -> Option<Answer> + Send + Sync>;

struct MockTransport {
    socket: usize,
    local: SocketAddr,
    script: Script,
    inbox: VecDeque<(Vec<u8>, SocketAddr)>,
}

impl Transport for MockTransport {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.local)
    }

    async fn send_to(&mut self, bytes: &[u8], target: SocketAddr) -> io::Result<()> {
        let mut attributes = Attributes::default();
        let message = Message::decode(bytes, &mut attributes)
            .map_err(|_| io::Error::from(io::ErrorKind::InvalidData))?;
        assert_eq!(message.method(), BINDING_REQUEST);

        let change = message.get::<ChangeRequest>().unwrap_or_default();
        let probe = Probe {
            socket: self.socket,
            local: self.local,
            target,
            change_ip: change.change_ip(),
            change_port: change.change_port(),
        };

        if let Some(answer) = (self.script)(&probe) {
            let mut buf = BytesMut::with_capacity(1500);
            let mut encoder = MessageEncoder::extend(BINDING_RESPONSE, &message, &mut buf);
            encoder.append::<XorMappedAddress>(answer.mapped);
            encoder.append::<MappedAddress>(answer.mapped);
            if let Some(other) = answer.other {
                encoder.append::<OtherAddress>(other);
            }

            encoder.flush().unwrap();
            self.inbox.push_back((buf.to_vec(), target));
        }

        Ok(())
    }

    async fn recv_from(&mut self, bytes: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        match self.inbox.pop_front() {
            Some((packet, source)) => {
                bytes[..packet.len()].copy_from_slice(&packet);
                Ok((packet.len(), source))
            }
            None => Err(io::ErrorKind::TimedOut.into()),
        }
    }
}

struct MockBinder {
    script: Script,
    bound: AtomicUsize,
}

impl MockBinder {
    fn new<F>(script: F) -> Self
    where
        F: Fn(&Probe) -> Option<Answer> + Send + Sync + 'static,
    {
        Self {
            script: Arc::new(script),
            bound: AtomicUsize::new(0),
        }
    }
}

impl Binder for MockBinder {
    type Transport = MockTransport;

    async fn bind(&self) -> io::Result<MockTransport> {
        let socket = self.bound.fetch_add(1, Ordering::SeqCst);
        Ok(MockTransport {
            socket,
            local: SocketAddr::new("192.168.1.7".parse().unwrap(), 50000 + socket as u16),
            script: self.script.clone(),
            inbox: VecDeque::new(),
        })
    }
}

fn server() -> SocketAddr {
    SERVER.parse().unwrap()
}

fn other() -> SocketAddr {
    OTHER.parse().unwrap()
}

#[tokio::test]
async fn udp_blocked() {
    let binder = MockBinder::new(|_| None);
    assert_eq!(rfc3489::discover(&binder, server()).await, NatType::UdpBlocked);
}

#[tokio::test]
async fn open_internet() {
    // no address rewriting, and responses from a changed endpoint
    // arrive.
    let binder = MockBinder::new(|probe| {
        Some(Answer {
            mapped: probe.local,
            other: None,
        })
    });

    assert_eq!(rfc3489::discover(&binder, server()).await, NatType::OpenInternet);
}

#[tokio::test]
async fn open_internet_over_loopback() {
    // a real socket pair: the default binder listens on the unspecified
    // address, and the responder answers every request with the true
    // source address, changed-endpoint requests included.
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let server = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut attributes = Attributes::default();
        let mut buf = [0u8; 1500];
        let mut res = BytesMut::with_capacity(1500);

        loop {
            let Ok((size, addr)) = socket.recv_from(&mut buf).await else {
                return;
            };

            let Ok(message) = Message::decode(&buf[..size], &mut attributes) else {
                continue;
            };

            let mut encoder = MessageEncoder::extend(BINDING_RESPONSE, &message, &mut res);
            encoder.append::<XorMappedAddress>(addr);
            encoder.append::<MappedAddress>(addr);
            encoder.flush().unwrap();

            if socket.send_to(&res, addr).await.is_err() {
                return;
            }
        }
    });

    assert_eq!(
        rfc3489::discover(&UdpBinder::default(), server).await,
        NatType::OpenInternet
    );
}

#[tokio::test]
async fn symmetric_udp_firewall() {
    // no address rewriting, but anything from a changed endpoint is
    // dropped.
    let binder = MockBinder::new(|probe| {
        if probe.change_ip || probe.change_port {
            return None;
        }

        Some(Answer {
            mapped: probe.local,
            other: None,
        })
    });

    assert_eq!(
        rfc3489::discover(&binder, server()).await,
        NatType::SymmetricUdpFirewall
    );
}

#[tokio::test]
async fn full_cone() {
    // one stable public mapping, reachable from anywhere.
    let binder = MockBinder::new(|_| {
        Some(Answer {
            mapped: "198.51.100.2:41000".parse().unwrap(),
            other: None,
        })
    });

    assert_eq!(rfc3489::discover(&binder, server()).await, NatType::FullCone);
}

#[tokio::test]
async fn restricted_cone() {
    // stable mapping; a changed port still gets through, a changed
    // address does not.
    let binder = MockBinder::new(|probe| {
        if probe.change_ip {
            return None;
        }

        Some(Answer {
            mapped: "198.51.100.2:41000".parse().unwrap(),
            other: None,
        })
    });

    assert_eq!(
        rfc3489::discover(&binder, server()).await,
        NatType::RestrictedCone
    );
}

#[tokio::test]
async fn port_restricted_cone() {
    // stable mapping; any changed endpoint is filtered.
    let binder = MockBinder::new(|probe| {
        if probe.change_ip || probe.change_port {
            return None;
        }

        Some(Answer {
            mapped: "198.51.100.2:41000".parse().unwrap(),
            other: None,
        })
    });

    assert_eq!(
        rfc3489::discover(&binder, server()).await,
        NatType::PortRestrictedCone
    );
}

#[tokio::test]
async fn symmetric_nat() {
    // every local socket gets its own external mapping.
    let binder = MockBinder::new(|probe| {
        if probe.change_ip || probe.change_port {
            return None;
        }

        Some(Answer {
            mapped: SocketAddr::new(
                "198.51.100.2".parse().unwrap(),
                41000 + probe.socket as u16,
            ),
            other: None,
        })
    });

    assert_eq!(
        rfc3489::discover(&binder, server()).await,
        NatType::SymmetricNat
    );
}

#[tokio::test]
async fn unanswered_retest_is_unknown() {
    // only the first plain binding request is answered; with the
    // repeated test from a fresh socket unanswered, the tree can
    // neither confirm nor rule out a symmetric nat.
    let binder = MockBinder::new(|probe| {
        if probe.socket != 0 || probe.change_ip || probe.change_port {
            return None;
        }

        Some(Answer {
            mapped: "198.51.100.2:41000".parse().unwrap(),
            other: None,
        })
    });

    assert_eq!(rfc3489::discover(&binder, server()).await, NatType::Unknown);
}

#[tokio::test]
async fn mapping_without_other_address() {
    let binder = MockBinder::new(|probe| {
        Some(Answer {
            mapped: probe.local,
            other: None,
        })
    });

    assert_eq!(
        rfc5780::mapping(&binder, server()).await,
        MappingBehavior::Unknown
    );
}

#[tokio::test]
async fn mapping_endpoint_independent() {
    let binder = MockBinder::new(|_| {
        Some(Answer {
            mapped: "198.51.100.2:41000".parse().unwrap(),
            other: Some(other()),
        })
    });

    assert_eq!(
        rfc5780::mapping(&binder, server()).await,
        MappingBehavior::EndpointIndependent
    );
}

#[tokio::test]
async fn mapping_address_dependent() {
    // same external address, a fresh port per destination address.
    let binder = MockBinder::new(|probe| {
        let port = if probe.target.ip() == server().ip() {
            41000
        } else {
            41001
        };

        Some(Answer {
            mapped: SocketAddr::new("198.51.100.2".parse().unwrap(), port),
            other: Some(other()),
        })
    });

    assert_eq!(
        rfc5780::mapping(&binder, server()).await,
        MappingBehavior::AddressDependent
    );
}

#[tokio::test]
async fn mapping_address_and_port_dependent() {
    // a fresh external endpoint per destination address and port.
    let binder = MockBinder::new(|probe| {
        let ip = if probe.target.ip() == server().ip() {
            "198.51.100.2"
        } else {
            "198.51.100.3"
        };

        Some(Answer {
            mapped: SocketAddr::new(ip.parse().unwrap(), 41000 + probe.target.port() % 100),
            other: Some(other()),
        })
    });

    assert_eq!(
        rfc5780::mapping(&binder, server()).await,
        MappingBehavior::AddressAndPortDependent
    );
}

#[tokio::test]
async fn filtering_ladder() {
    let permissive = MockBinder::new(|_| {
        Some(Answer {
            mapped: "198.51.100.2:41000".parse().unwrap(),
            other: Some(other()),
        })
    });

    assert_eq!(
        rfc5780::filtering(&permissive, server()).await,
        FilteringBehavior::EndpointIndependent
    );

    let address_dependent = MockBinder::new(|probe| {
        if probe.change_ip {
            return None;
        }

        Some(Answer {
            mapped: "198.51.100.2:41000".parse().unwrap(),
            other: Some(other()),
        })
    });

    assert_eq!(
        rfc5780::filtering(&address_dependent, server()).await,
        FilteringBehavior::AddressDependent
    );

    let strict = MockBinder::new(|probe| {
        if probe.change_ip || probe.change_port {
            return None;
        }

        Some(Answer {
            mapped: "198.51.100.2:41000".parse().unwrap(),
            other: Some(other()),
        })
    });

    assert_eq!(
        rfc5780::filtering(&strict, server()).await,
        FilteringBehavior::AddressAndPortDependent
    );
}
