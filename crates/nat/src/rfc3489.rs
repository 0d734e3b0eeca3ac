//! [RFC3489]: https://datatracker.ietf.org/doc/html/rfc3489
//!
//! The classic [RFC3489] Section 10.1 classification.  Four binding
//! tests distinguish the absence of a NAT, the cone variants, and a
//! symmetric NAT.  Timeouts and transport failures are answers here,
//! not errors: every failure terminates a branch of the tree.

use std::net::SocketAddr;

use crate::{
    request::BindingRequest,
    transport::{Binder, Transport},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NatType {
    /// The tests could not produce a classification, e.g. the local
    /// socket failed to bind or a server stopped answering mid-tree.
    #[default]
    Unknown,
    /// No response to the first binding test; UDP does not leave this
    /// host or never comes back.
    UdpBlocked,
    /// The mapped address equals the local one and responses from a
    /// changed address arrive: no NAT and no address-sensitive firewall.
    OpenInternet,
    /// No NAT, but a firewall that only passes responses from the
    /// address the request went to.
    SymmetricUdpFirewall,
    /// The mapping accepts datagrams from any remote address.
    FullCone,
    /// The mapping accepts datagrams from any port of a remote address
    /// the client has sent to.
    RestrictedCone,
    /// The mapping accepts datagrams only from the exact remote address
    /// and port the client has sent to.
    PortRestrictedCone,
    /// Each destination gets its own mapping.
    SymmetricNat,
}

impl std::fmt::Display for NatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Unknown => "unknown",
            Self::UdpBlocked => "udp blocked",
            Self::OpenInternet => "open internet",
            Self::SymmetricUdpFirewall => "symmetric udp firewall",
            Self::FullCone => "full cone",
            Self::RestrictedCone => "restricted cone",
            Self::PortRestrictedCone => "port restricted cone",
            Self::SymmetricNat => "symmetric nat",
        })
    }
}

/// Runs the four-test tree against `server`.
///
/// Dropping the returned future cancels discovery; no further round
/// trips are issued.
pub async fn discover<B: Binder>(binder: &B, server: SocketAddr) -> NatType {
    let Ok(mut transport) = binder.bind().await else {
        return NatType::Unknown;
    };

    // Test I: a plain binding request. No answer at all means udp
    // never makes it out or back.
    let Ok(first) = BindingRequest::default().send(&mut transport, server).await else {
        return NatType::UdpBlocked;
    };

    let local = transport.local_addr().ok();
    log::debug!(
        "test I: mapped={}, local={:?}",
        first.mapped_address,
        local
    );

    // No address rewriting observed: distinguish the open internet from
    // a firewall by whether a response from a changed address and port
    // gets through.
    if local == Some(first.mapped_address) {
        let change_all = BindingRequest {
            change_ip: true,
            change_port: true,
        };

        return match change_all.send(&mut transport, server).await {
            Ok(_) => NatType::OpenInternet,
            Err(_) => NatType::SymmetricUdpFirewall,
        };
    }

    // Test II from a new local socket: a response from a changed
    // address and port passes any full cone mapping.
    {
        let Ok(mut fresh) = binder.bind().await else {
            return NatType::Unknown;
        };

        let change_all = BindingRequest {
            change_ip: true,
            change_port: true,
        };

        if change_all.send(&mut fresh, server).await.is_ok() {
            return NatType::FullCone;
        }
    }

    // Test I again from a new local socket: a symmetric NAT hands the
    // new flow a different mapping.
    let Ok(mut fresh) = binder.bind().await else {
        return NatType::Unknown;
    };

    let Ok(second) = BindingRequest::default().send(&mut fresh, server).await else {
        return NatType::Unknown;
    };

    log::debug!(
        "test I (fresh socket): mapped={}, previous={}",
        second.mapped_address,
        first.mapped_address
    );

    if second.mapped_address != first.mapped_address {
        return NatType::SymmetricNat;
    }

    // Test III: only the port changes. Getting through splits the two
    // restricted cone variants.
    let change_port = BindingRequest {
        change_ip: false,
        change_port: true,
    };

    match change_port.send(&mut transport, server).await {
        Ok(_) => NatType::RestrictedCone,
        Err(_) => NatType::PortRestrictedCone,
    }
}
