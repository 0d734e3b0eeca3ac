pub mod address;
pub mod error;

use std::{fmt::Debug, net::SocketAddr};

use bytes::BufMut;

use crate::Error;

pub use self::{
    address::XAddress,
    error::{ErrorCode, ErrorType},
};

/// STUN Attributes Registry
///
/// [RFC8126]: https://datatracker.ietf.org/doc/html/rfc8126
/// [RFC5389]: https://datatracker.ietf.org/doc/html/rfc5389
/// [RFC5780]: https://datatracker.ietf.org/doc/html/rfc5780
///
/// A STUN attribute type is a hex number in the range 0x0000-0xFFFF.
/// STUN attribute types in the range 0x0000-0x7FFF are considered
/// comprehension-required; STUN attribute types in the range
/// 0x8000-0xFFFF are considered comprehension-optional.  A STUN agent
/// handles unknown comprehension-required and comprehension-optional
/// attributes differently.
///
/// Comprehension-required range (0x0000-0x7FFF):
/// 0x0001: MAPPED-ADDRESS
/// 0x0003: CHANGE-REQUEST (classic STUN / [RFC5780])
/// 0x0009: ERROR-CODE
/// 0x000A: UNKNOWN-ATTRIBUTES
/// 0x0020: XOR-MAPPED-ADDRESS
///
/// Comprehension-optional range (0x8000-0xFFFF):
/// 0x8022: SOFTWARE
/// 0x8023: ALTERNATE-SERVER
/// 0x802B: RESPONSE-ORIGIN
/// 0x802C: OTHER-ADDRESS ([RFC5780])
#[repr(u16)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AttributeType {
    MappedAddress = 0x0001,
    ChangeRequest = 0x0003,
    ErrorCode = 0x0009,
    UnknownAttributes = 0x000A,
    XorMappedAddress = 0x0020,
    Software = 0x8022,
    AlternateServer = 0x8023,
    ResponseOrigin = 0x802B,
    OtherAddress = 0x802C,
}

impl AttributeType {
    /// # Test
    ///
    /// ```
    /// use stun_probe_codec::message::attributes::AttributeType;
    ///
    /// assert_eq!(AttributeType::from_code(0x0020), Some(AttributeType::XorMappedAddress));
    /// assert_eq!(AttributeType::from_code(0x0099), None);
    /// ```
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0x0001 => Self::MappedAddress,
            0x0003 => Self::ChangeRequest,
            0x0009 => Self::ErrorCode,
            0x000A => Self::UnknownAttributes,
            0x0020 => Self::XorMappedAddress,
            0x8022 => Self::Software,
            0x8023 => Self::AlternateServer,
            0x802B => Self::ResponseOrigin,
            0x802C => Self::OtherAddress,
            _ => return None,
        })
    }
}

/// dyn stun message attribute.
pub trait Attribute<'a> {
    type Error: Debug;

    /// current attribute inner type.
    type Item;

    /// current attribute type.
    const TYPE: AttributeType;

    /// write the current attribute to the bytesfer.
    #[allow(unused_variables)]
    fn serialize<B: BufMut>(value: Self::Item, bytes: &mut B, transaction_id: &'a [u8; 12]) {}

    /// convert bytesfer to current attribute.
    fn deserialize(bytes: &'a [u8], transaction_id: &'a [u8; 12]) -> Result<Self::Item, Self::Error>;
}

/// [RFC3489]: https://datatracker.ietf.org/doc/html/rfc3489
///
/// The MAPPED-ADDRESS attribute indicates a reflexive transport address
/// of the client.  It consists of an 8-bit address family and a 16-bit
/// port, followed by a fixed-length value representing the IP address.
/// If the address family is IPv4, the address MUST be 32 bits.  If the
/// address family is IPv6, the address MUST be 128 bits.  All fields
/// must be in network byte order.
///
/// This attribute is used only by servers for achieving backwards
/// compatibility with [RFC3489] clients.
#[derive(Debug, Clone, Copy)]
pub struct MappedAddress;

impl<'a> Attribute<'a> for MappedAddress {
    type Error = Error;
    type Item = SocketAddr;

    const TYPE: AttributeType = AttributeType::MappedAddress;

    fn serialize<B: BufMut>(value: Self::Item, bytes: &mut B, transaction_id: &'a [u8; 12]) {
        XAddress::serialize(&value, transaction_id, bytes, false)
    }

    fn deserialize(bytes: &'a [u8], transaction_id: &'a [u8; 12]) -> Result<Self::Item, Self::Error> {
        XAddress::deserialize(bytes, transaction_id, false)
    }
}

/// The XOR-MAPPED-ADDRESS attribute is identical to the MAPPED-ADDRESS
/// attribute, except that the reflexive transport address is obfuscated
/// through the XOR function.  Deployment experience found that some NATs
/// rewrite 32-bit binary payloads containing the NAT's public IP
/// address; XOR'ing the address with the magic cookie defeats that
/// rewriting, which is why receivers prefer this attribute over
/// MAPPED-ADDRESS when both are present.
#[derive(Debug, Clone, Copy)]
pub struct XorMappedAddress;

impl<'a> Attribute<'a> for XorMappedAddress {
    type Error = Error;
    type Item = SocketAddr;

    const TYPE: AttributeType = AttributeType::XorMappedAddress;

    fn serialize<B: BufMut>(value: Self::Item, bytes: &mut B, transaction_id: &'a [u8; 12]) {
        XAddress::serialize(&value, transaction_id, bytes, true)
    }

    fn deserialize(bytes: &'a [u8], transaction_id: &'a [u8; 12]) -> Result<Self::Item, Self::Error> {
        XAddress::deserialize(bytes, transaction_id, true)
    }
}

/// The RESPONSE-ORIGIN attribute is inserted by the server and indicates
/// the source IP address and port the response was sent from.  It is
/// useful for detecting double NAT configurations.  It is only present
/// in Binding Responses.
#[derive(Debug, Clone, Copy)]
pub struct ResponseOrigin;

impl<'a> Attribute<'a> for ResponseOrigin {
    type Error = Error;
    type Item = SocketAddr;

    const TYPE: AttributeType = AttributeType::ResponseOrigin;

    fn serialize<B: BufMut>(value: Self::Item, bytes: &mut B, transaction_id: &'a [u8; 12]) {
        XAddress::serialize(&value, transaction_id, bytes, false)
    }

    fn deserialize(bytes: &'a [u8], transaction_id: &'a [u8; 12]) -> Result<Self::Item, Self::Error> {
        XAddress::deserialize(bytes, transaction_id, false)
    }
}

/// [RFC5780]: https://datatracker.ietf.org/doc/html/rfc5780
///
/// The OTHER-ADDRESS attribute is used in Binding Responses.  It informs
/// the client of the source IP address and port that would be used if
/// the client requested the "change IP" and "change port" behavior
/// ([RFC5780] Section 7.2).  Its presence is the capability signal the
/// NAT behavior discovery ladders key on: without it a server cannot
/// answer from an alternate address and the discovery result is unknown.
#[derive(Debug, Clone, Copy)]
pub struct OtherAddress;

impl<'a> Attribute<'a> for OtherAddress {
    type Error = Error;
    type Item = SocketAddr;

    const TYPE: AttributeType = AttributeType::OtherAddress;

    fn serialize<B: BufMut>(value: Self::Item, bytes: &mut B, transaction_id: &'a [u8; 12]) {
        XAddress::serialize(&value, transaction_id, bytes, false)
    }

    fn deserialize(bytes: &'a [u8], transaction_id: &'a [u8; 12]) -> Result<Self::Item, Self::Error> {
        XAddress::deserialize(bytes, transaction_id, false)
    }
}

/// The alternate server represents an alternate transport address
/// identifying a different STUN server that the STUN client should try.
///
/// It is encoded in the same way as MAPPED-ADDRESS and thus refers to a
/// single server by IP address.
#[derive(Debug, Clone, Copy)]
pub struct AlternateServer;

impl<'a> Attribute<'a> for AlternateServer {
    type Error = Error;
    type Item = SocketAddr;

    const TYPE: AttributeType = AttributeType::AlternateServer;

    fn serialize<B: BufMut>(value: Self::Item, bytes: &mut B, transaction_id: &'a [u8; 12]) {
        XAddress::serialize(&value, transaction_id, bytes, false)
    }

    fn deserialize(bytes: &'a [u8], transaction_id: &'a [u8; 12]) -> Result<Self::Item, Self::Error> {
        XAddress::deserialize(bytes, transaction_id, false)
    }
}

/// [RFC3629]: https://datatracker.ietf.org/doc/html/rfc3629
///
/// The SOFTWARE attribute contains a textual description of the software
/// being used by the agent sending the message.  It is used by clients
/// and servers.  Its value SHOULD include manufacturer and version
/// number.  The attribute has no impact on operation of the protocol and
/// serves only as a tool for diagnostic and debugging purposes.  The
/// value of SOFTWARE is variable length.  It MUST be a UTF-8-encoded
/// [RFC3629] sequence of fewer than 128 characters.
#[derive(Debug, Clone, Copy)]
pub struct Software;

impl<'a> Attribute<'a> for Software {
    type Error = Error;
    type Item = &'a str;

    const TYPE: AttributeType = AttributeType::Software;

    fn serialize<B: BufMut>(value: Self::Item, bytes: &mut B, _: &'a [u8; 12]) {
        bytes.put(value.as_bytes());
    }

    fn deserialize(bytes: &'a [u8], _: &'a [u8; 12]) -> Result<Self::Item, Self::Error> {
        Ok(std::str::from_utf8(bytes)?)
    }
}

/// The UNKNOWN-ATTRIBUTES attribute is present only in an error response
/// when the response code in the ERROR-CODE attribute is 420.
///
/// The attribute contains a list of 16-bit values, each of which
/// represents an attribute type that was not understood by the server.
/// An odd number of entries leaves the value 2 bytes short of a 32-bit
/// boundary; the encoder pads as for any attribute while the length
/// field keeps the unpadded byte count.
#[derive(Debug, Clone)]
pub struct UnknownAttributes;

impl<'a> Attribute<'a> for UnknownAttributes {
    type Error = Error;
    type Item = Vec<u16>;

    const TYPE: AttributeType = AttributeType::UnknownAttributes;

    fn serialize<B: BufMut>(value: Self::Item, bytes: &mut B, _: &'a [u8; 12]) {
        for it in value {
            bytes.put_u16(it);
        }
    }

    fn deserialize(bytes: &'a [u8], _: &'a [u8; 12]) -> Result<Self::Item, Self::Error> {
        if bytes.len() % 2 != 0 {
            return Err(Error::TruncatedAttribute);
        }

        Ok(bytes
            .chunks_exact(2)
            .map(|it| u16::from_be_bytes([it[0], it[1]]))
            .collect())
    }
}

/// [RFC5780]: https://datatracker.ietf.org/doc/html/rfc5780
///
/// The CHANGE-REQUEST attribute contains two flags to control the IP
/// address and port that the server uses to send the response ([RFC5780]
/// Section 7.1).  The flags are the "change IP" (0x04) and "change port"
/// (0x02) bits of a 32-bit word; a client joins NAT filtering tests by
/// setting one or both.  The full word is kept so unassigned bits a peer
/// sets survive a decode/re-encode cycle; the wire form is always
/// derived from the word, never cached.
///
/// # Test
///
/// ```
/// use stun_probe_codec::message::attributes::ChangeRequest;
///
/// let mut value = ChangeRequest::new(true, false);
/// assert!(value.change_ip());
/// assert!(!value.change_port());
///
/// value.set_change_port(true);
/// value.set_change_ip(false);
/// assert_eq!(value.flags(), 0x0000_0002);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeRequest {
    flags: u32,
}

impl ChangeRequest {
    const CHANGE_IP: u32 = 0x0000_0004;
    const CHANGE_PORT: u32 = 0x0000_0002;

    pub fn new(change_ip: bool, change_port: bool) -> Self {
        let mut it = Self::default();
        it.set_change_ip(change_ip);
        it.set_change_port(change_port);
        it
    }

    pub fn from_flags(flags: u32) -> Self {
        Self { flags }
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn change_ip(&self) -> bool {
        self.flags & Self::CHANGE_IP != 0
    }

    pub fn change_port(&self) -> bool {
        self.flags & Self::CHANGE_PORT != 0
    }

    pub fn set_change_ip(&mut self, value: bool) {
        if value {
            self.flags |= Self::CHANGE_IP;
        } else {
            self.flags &= !Self::CHANGE_IP;
        }
    }

    pub fn set_change_port(&mut self, value: bool) {
        if value {
            self.flags |= Self::CHANGE_PORT;
        } else {
            self.flags &= !Self::CHANGE_PORT;
        }
    }
}

impl<'a> Attribute<'a> for ChangeRequest {
    type Error = Error;
    type Item = Self;

    const TYPE: AttributeType = AttributeType::ChangeRequest;

    fn serialize<B: BufMut>(value: Self::Item, bytes: &mut B, _: &'a [u8; 12]) {
        bytes.put_u32(value.flags);
    }

    fn deserialize(bytes: &'a [u8], _: &'a [u8; 12]) -> Result<Self::Item, Self::Error> {
        Ok(Self::from_flags(u32::from_be_bytes(bytes.try_into()?)))
    }
}
