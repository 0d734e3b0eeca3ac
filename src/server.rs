use std::{collections::VecDeque, io::ErrorKind::ConnectionReset, net::SocketAddr};

use bytes::BytesMut;
use codec::{
    Attributes,
    message::{
        Message, MessageEncoder,
        attributes::{
            ErrorCode, ErrorType, MappedAddress, ResponseOrigin, Software, UnknownAttributes,
            XorMappedAddress,
        },
        methods::{BINDING_REQUEST, BINDING_RESPONSE},
    },
};
use tokio::net::UdpSocket;

const SOFTWARE: &str = concat!("stun-probe/", env!("CARGO_PKG_VERSION"));

/// How many recent transaction ids the dispatch loop remembers for
/// duplicate suppression.
const DEDUP_CAPACITY: usize = 100;

/// Recently seen transaction ids, a bounded ring owned by the dispatch
/// loop. Checking is a linear scan; at 100 entries that is cheaper than
/// maintaining a set next to the queue.
struct DedupRing {
    tokens: VecDeque<[u8; 12]>,
}

impl DedupRing {
    fn new() -> Self {
        Self {
            tokens: VecDeque::with_capacity(DEDUP_CAPACITY),
        }
    }

    /// Records the token, reporting whether it was already present.
    /// The oldest entry is evicted at capacity.
    fn check(&mut self, token: [u8; 12]) -> bool {
        if self.tokens.contains(&token) {
            return true;
        }

        if self.tokens.len() == DEDUP_CAPACITY {
            self.tokens.pop_front();
        }

        self.tokens.push_back(token);
        false
    }
}

/// udp binding server dispatch loop.
///
/// read binding requests from the UDP socket and answer each with the
/// sender's reflexive address. requests carrying unknown
/// comprehension-required attributes get a 420 error response instead.
pub async fn run(listen: SocketAddr) -> anyhow::Result<()> {
    let socket = UdpSocket::bind(listen).await?;
    let local_addr = socket.local_addr()?;
    log::info!("udp server listening: interface={}", local_addr);

    let mut dedup = DedupRing::new();
    let mut attributes = Attributes::default();
    let mut buf = vec![0u8; 4096];
    let mut res = BytesMut::with_capacity(1500);

    loop {
        let (size, addr) = match socket.recv_from(&mut buf).await {
            Ok(it) => it,
            Err(e) => {
                if e.kind() != ConnectionReset {
                    return Err(e.into());
                } else {
                    continue;
                }
            }
        };

        log::trace!(
            "udp socket receive: size={}, addr={:?}, interface={:?}",
            size,
            addr,
            local_addr
        );

        let message = match Message::decode(&buf[..size], &mut attributes) {
            Ok(it) => it,
            Err(e) => {
                log::trace!("udp socket process failed: addr={:?}, error={}", addr, e);
                continue;
            }
        };

        if message.method() != BINDING_REQUEST {
            continue;
        }

        let token = *message.token();

        // a retransmitted request would get the same answer anyway,
        // dropping it saves the duplicate reply.
        if dedup.check(token) {
            log::trace!("duplicate transaction id: addr={:?}", addr);
            continue;
        }

        let unknown = message.unknown_comprehension_required();
        if !unknown.is_empty() {
            let unknown = unknown.to_vec();
            let mut encoder = MessageEncoder::extend(message.method().error(), &message, &mut res);
            encoder.append::<ErrorCode>(ErrorType::UnknownAttribute.into());
            encoder.append::<UnknownAttributes>(unknown);
            encoder.flush()?;
        } else {
            let mut encoder = MessageEncoder::extend(BINDING_RESPONSE, &message, &mut res);
            encoder.append::<XorMappedAddress>(addr);
            encoder.append::<MappedAddress>(addr);
            encoder.append::<ResponseOrigin>(local_addr);
            encoder.append::<Software>(SOFTWARE);
            encoder.flush()?;
        }

        if let Err(e) = socket.send_to(&res, addr).await {
            if e.kind() != ConnectionReset {
                return Err(e.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DEDUP_CAPACITY, DedupRing};

    #[test]
    fn dedup_ring_evicts_oldest() {
        let mut ring = DedupRing::new();

        assert!(!ring.check([0u8; 12]));
        assert!(ring.check([0u8; 12]));

        for i in 0..DEDUP_CAPACITY {
            ring.check([(i + 1) as u8; 12]);
        }

        // the first token fell out of the ring and counts as new again.
        assert!(!ring.check([0u8; 12]));
    }
}
