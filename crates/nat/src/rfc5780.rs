//! [RFC5780]: https://datatracker.ietf.org/doc/html/rfc5780
//!
//! [RFC5780] NAT behavior discovery splits the classification into a
//! mapping dimension (which destinations share an external mapping)
//! and a filtering dimension (which sources may use it).  Both ladders
//! need a server with an alternate address, signalled by OTHER-ADDRESS
//! in the primary response; without it the result is `Unknown`.

use std::net::SocketAddr;

use crate::{request::BindingRequest, transport::Binder};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingBehavior {
    #[default]
    Unknown,
    /// One external mapping regardless of destination.
    EndpointIndependent,
    /// A mapping per destination address.
    AddressDependent,
    /// A mapping per destination address and port.
    AddressAndPortDependent,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilteringBehavior {
    #[default]
    Unknown,
    /// Any remote endpoint may send through the mapping.
    EndpointIndependent,
    /// Only remote addresses the client has sent to.
    AddressDependent,
    /// Only the exact remote address and port the client has sent to.
    AddressAndPortDependent,
}

/// Mapping behavior ladder, one socket for all requests so every test
/// observes the same local endpoint's mappings.
pub async fn mapping<B: Binder>(binder: &B, server: SocketAddr) -> MappingBehavior {
    let Ok(mut transport) = binder.bind().await else {
        return MappingBehavior::Unknown;
    };

    let Ok(first) = BindingRequest::default().send(&mut transport, server).await else {
        return MappingBehavior::Unknown;
    };

    // the capability signal: no alternate address, no ladder.
    let Some(other) = first.other_address else {
        return MappingBehavior::Unknown;
    };

    // second request: alternate IP, primary port.
    let target = SocketAddr::new(other.ip(), server.port());
    let Ok(second) = BindingRequest::default().send(&mut transport, target).await else {
        return MappingBehavior::Unknown;
    };

    log::debug!(
        "mapping ladder: first={}, second={}",
        first.mapped_address,
        second.mapped_address
    );

    if second.mapped_address == first.mapped_address {
        return MappingBehavior::EndpointIndependent;
    }

    if second.mapped_address.ip() == first.mapped_address.ip() {
        return MappingBehavior::AddressDependent;
    }

    // third request: alternate IP and port.
    let Ok(third) = BindingRequest::default().send(&mut transport, other).await else {
        return MappingBehavior::Unknown;
    };

    if third.mapped_address != second.mapped_address {
        MappingBehavior::AddressAndPortDependent
    } else {
        MappingBehavior::AddressDependent
    }
}

/// Filtering behavior ladder, a fresh socket per test so one test's
/// permissive hole never lets the next test's probe through.
pub async fn filtering<B: Binder>(binder: &B, server: SocketAddr) -> FilteringBehavior {
    {
        let Ok(mut transport) = binder.bind().await else {
            return FilteringBehavior::Unknown;
        };

        let change_all = BindingRequest {
            change_ip: true,
            change_port: true,
        };

        if change_all.send(&mut transport, server).await.is_ok() {
            return FilteringBehavior::EndpointIndependent;
        }
    }

    let Ok(mut transport) = binder.bind().await else {
        return FilteringBehavior::Unknown;
    };

    let change_port = BindingRequest {
        change_ip: false,
        change_port: true,
    };

    if change_port.send(&mut transport, server).await.is_ok() {
        FilteringBehavior::AddressDependent
    } else {
        FilteringBehavior::AddressAndPortDependent
    }
}

/// Runs both ladders in sequence.
pub async fn discover<B: Binder>(
    binder: &B,
    server: SocketAddr,
) -> (MappingBehavior, FilteringBehavior) {
    (
        mapping(binder, server).await,
        filtering(binder, server).await,
    )
}
