//! NAT behavior discovery over STUN.
//!
//! [RFC3489]: https://datatracker.ietf.org/doc/html/rfc3489
//! [RFC5780]: https://datatracker.ietf.org/doc/html/rfc5780
//!
//! Two discovery procedures are provided: the classic [RFC3489]
//! four-test classification ([`rfc3489::discover`]) and the [RFC5780]
//! mapping/filtering behavior split ([`rfc5780::discover`]).  Both are
//! generic over the [`Transport`]/[`Binder`] traits, so the decision
//! trees run unchanged against real UDP sockets or a scripted server.
//!
//! ```no_run
//! use stun_probe_nat::{UdpBinder, rfc3489};
//!
//! #[tokio::main]
//! async fn main() {
//!     let binder = UdpBinder::default();
//!     let server = "178.128.88.27:3478".parse().unwrap();
//!
//!     println!("{:?}", rfc3489::discover(&binder, server).await);
//! }
//! ```

pub mod request;
pub mod rfc3489;
pub mod rfc5780;
pub mod transport;

pub use self::{
    request::{BindingRequest, BindingResponse, Error},
    transport::{Binder, DEFAULT_TIMEOUT, Transport, UdpBinder, UdpTransport},
};
