use std::{io, net::SocketAddr};

use bytes::BytesMut;
use codec::{
    Attributes,
    message::{
        Message, MessageEncoder,
        attributes::{
            ChangeRequest, ErrorCode, MappedAddress, OtherAddress, ResponseOrigin, Software,
            XorMappedAddress,
        },
        methods::{BINDING_ERROR, BINDING_REQUEST, BINDING_RESPONSE},
    },
};
use rand::Rng;

use crate::transport::Transport;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    /// The receive window elapsed without a matching response.
    Timeout,
    Codec(codec::Error),
    MissingAttribute(&'static str),
    /// The server answered with a Binding error response carrying this
    /// ERROR-CODE.
    Stun(u16),
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        if value.kind() == io::ErrorKind::TimedOut {
            Self::Timeout
        } else {
            Self::Io(value)
        }
    }
}

impl From<codec::Error> for Error {
    fn from(value: codec::Error) -> Self {
        Self::Codec(value)
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A single Binding round trip, optionally asking the server to answer
/// from a changed IP and/or port (RFC 5780 CHANGE-REQUEST).
#[derive(Debug, Default, Clone, Copy)]
pub struct BindingRequest {
    pub change_ip: bool,
    pub change_port: bool,
}

#[derive(Debug, Clone)]
pub struct BindingResponse {
    /// The reflexive transport address, XOR-MAPPED-ADDRESS when present,
    /// MAPPED-ADDRESS otherwise.
    pub mapped_address: SocketAddr,
    pub other_address: Option<SocketAddr>,
    pub response_origin: Option<SocketAddr>,
    pub software: Option<String>,
}

impl BindingRequest {
    /// Sends the request and waits for the matching response.
    ///
    /// A fresh random transaction id is drawn per call; datagrams whose
    /// transaction id does not match are dropped and the wait continues
    /// inside the same receive window. There is no retransmission: a
    /// lost request is reported as [`Error::Timeout`] and the caller
    /// decides what that negative signal means.
    pub async fn send<T: Transport>(
        &self,
        transport: &mut T,
        server: SocketAddr,
    ) -> Result<BindingResponse, Error> {
        let mut token = [0u8; 12];
        rand::rng().fill(&mut token);

        let mut bytes = BytesMut::with_capacity(1500);

        {
            let mut encoder = MessageEncoder::new(BINDING_REQUEST, &token, &mut bytes);
            if self.change_ip || self.change_port {
                encoder.append::<ChangeRequest>(ChangeRequest::new(self.change_ip, self.change_port));
            }

            encoder.flush()?;
        }

        transport.send_to(&bytes, server).await?;

        let mut buffer = [0u8; 1500];
        let mut attributes = Attributes::default();

        loop {
            let (size, source) = transport.recv_from(&mut buffer).await?;

            let message = match Message::decode(&buffer[..size], &mut attributes) {
                Ok(it) => it,
                // not every datagram on the socket is a stun message.
                Err(_) => continue,
            };

            if message.token() != &token {
                continue;
            }

            if message.method() == BINDING_ERROR {
                let code = message
                    .get::<ErrorCode>()
                    .map(|it| it.code())
                    .ok_or(Error::MissingAttribute("ERROR-CODE"))?;

                return Err(Error::Stun(code));
            }

            if message.method() != BINDING_RESPONSE {
                continue;
            }

            log::debug!(
                "binding response: server={}, source={}, change_ip={}, change_port={}",
                server,
                source,
                self.change_ip,
                self.change_port
            );

            let mapped_address = message
                .get::<XorMappedAddress>()
                .or_else(|| message.get::<MappedAddress>())
                .ok_or(Error::MissingAttribute("XOR-MAPPED-ADDRESS"))?;

            return Ok(BindingResponse {
                mapped_address,
                other_address: message.get::<OtherAddress>(),
                response_origin: message.get::<ResponseOrigin>(),
                software: message.get::<Software>().map(str::to_string),
            });
        }
    }
}
