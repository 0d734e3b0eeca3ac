use bytes::BufMut;

use crate::{
    Error,
    message::attributes::{Attribute, AttributeType},
};

/// [RFC3629]: https://datatracker.ietf.org/doc/html/rfc3629
/// [RFC7231]: https://datatracker.ietf.org/doc/html/rfc7231
/// [RFC3261]: https://datatracker.ietf.org/doc/html/rfc3261
///
/// The ERROR-CODE attribute is used in error response messages.  It
/// contains a numeric error code value in the range of 300 to 699 plus a
/// textual reason phrase encoded in UTF-8 [RFC3629]; it is also
/// consistent in its code assignments and semantics with SIP [RFC3261]
/// and HTTP [RFC7231].  The reason phrase is meant for diagnostic
/// purposes and can be anything appropriate for the error code.
/// Recommended reason phrases for the defined error codes are included
/// in the IANA registry for error codes.  The reason phrase MUST be a
/// UTF-8-encoded [RFC3629] sequence of fewer than 128 characters.
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           Reserved, should be 0         |Class|     Number    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      Reason Phrase (variable)                                ..
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// To facilitate processing, the class of the error code (the hundreds
/// digit) is encoded separately from the rest of the code.  The Class
/// MUST be between 3 and 6; the Number represents the code modulo 100
/// and MUST be between 0 and 99.  The value held here is the plain
/// decimal code; the class/number split exists only on the wire.
#[derive(Debug, Clone, Copy)]
pub struct ErrorCode<'a> {
    code: u16,
    reason: &'a str,
}

impl<'a> ErrorCode<'a> {
    /// # Test
    ///
    /// ```
    /// use stun_probe_codec::message::attributes::ErrorCode;
    ///
    /// let error = ErrorCode::new(420, "Unknown Attribute").unwrap();
    /// assert_eq!(error.class(), 4);
    /// assert_eq!(error.number(), 20);
    ///
    /// assert!(ErrorCode::new(200, "OK").is_err());
    /// assert!(ErrorCode::new(700, "").is_err());
    /// ```
    pub fn new(code: u16, reason: &'a str) -> Result<Self, Error> {
        if !(300..=699).contains(&code) || reason.chars().count() > 127 {
            return Err(Error::OutOfRange);
        }

        Ok(Self { code, reason })
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn class(&self) -> u8 {
        (self.code / 100) as u8
    }

    pub fn number(&self) -> u8 {
        (self.code % 100) as u8
    }

    pub fn reason(&self) -> &'a str {
        self.reason
    }
}

impl<'a> Attribute<'a> for ErrorCode<'a> {
    type Error = Error;
    type Item = Self;

    const TYPE: AttributeType = AttributeType::ErrorCode;

    fn serialize<B: BufMut>(value: Self::Item, bytes: &mut B, _: &'a [u8; 12]) {
        bytes.put_u16(0x0000);
        bytes.put_u8(value.class());
        bytes.put_u8(value.number());
        bytes.put(value.reason.as_bytes());
    }

    /// # Test
    ///
    /// ```
    /// use stun_probe_codec::message::attributes::{Attribute, ErrorCode};
    ///
    /// let buffer = [
    ///     0x00u8, 0x00, 0x03, 0x00, 0x54, 0x72, 0x79, 0x20, 0x41, 0x6c, 0x74,
    ///     0x65, 0x72, 0x6e, 0x61, 0x74, 0x65,
    /// ];
    ///
    /// let error = ErrorCode::deserialize(&buffer[..], &[0u8; 12]).unwrap();
    /// assert_eq!(error.code(), 300);
    /// assert_eq!(error.reason(), "Try Alternate");
    /// ```
    fn deserialize(bytes: &'a [u8], _: &'a [u8; 12]) -> Result<Self::Item, Self::Error> {
        if bytes.len() < 4 {
            return Err(Error::TruncatedAttribute);
        }

        // receivers ignore the reserved bits, only the low 3 bits of the
        // class byte carry the hundreds digit.
        let class = (bytes[2] & 0x07) as u16;
        let number = bytes[3] as u16;
        if !(3..=6).contains(&class) || number > 99 {
            return Err(Error::OutOfRange);
        }

        Self::new(class * 100 + number, std::str::from_utf8(&bytes[4..])?)
    }
}

impl Eq for ErrorCode<'_> {}
impl PartialEq for ErrorCode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

/// The following error codes, along with their recommended reason
/// phrases, are defined:
///
/// 300  Try Alternate: The client should contact an alternate server for
///      this request.
///
/// 400  Bad Request: The request was malformed.  The client SHOULD NOT
///      retry the request without modification from the previous
///      attempt.
///
/// 401  Unauthorized: The request did not contain the correct
///      credentials to proceed.
///
/// 420  Unknown Attribute: The server received a STUN packet containing
///      a comprehension-required attribute that it did not understand.
///      The server MUST put this unknown attribute in the UNKNOWN-
///      ATTRIBUTES attribute of its error response.
///
/// 438  Stale Nonce: The NONCE used by the client was no longer valid.
///
/// 500  Server Error: The server has suffered a temporary error.  The
///      client should try again.
#[repr(u16)]
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
pub enum ErrorType {
    TryAlternate = 300,
    BadRequest = 400,
    Unauthorized = 401,
    UnknownAttribute = 420,
    StaleNonce = 438,
    ServerError = 500,
}

impl From<ErrorType> for &'static str {
    /// # Test
    ///
    /// ```
    /// use stun_probe_codec::message::attributes::ErrorType;
    ///
    /// let reason: &'static str = ErrorType::TryAlternate.into();
    /// assert_eq!(reason, "Try Alternate");
    /// ```
    fn from(value: ErrorType) -> Self {
        match value {
            ErrorType::TryAlternate => "Try Alternate",
            ErrorType::BadRequest => "Bad Request",
            ErrorType::Unauthorized => "Unauthorized",
            ErrorType::UnknownAttribute => "Unknown Attribute",
            ErrorType::StaleNonce => "Stale Nonce",
            ErrorType::ServerError => "Server Error",
        }
    }
}

impl From<ErrorType> for ErrorCode<'static> {
    /// # Test
    ///
    /// ```
    /// use stun_probe_codec::message::attributes::{ErrorCode, ErrorType};
    ///
    /// let error = ErrorCode::from(ErrorType::UnknownAttribute);
    /// assert_eq!(error.code(), 420);
    /// assert_eq!(error.reason(), "Unknown Attribute");
    /// ```
    fn from(value: ErrorType) -> Self {
        Self {
            code: value as u16,
            reason: value.into(),
        }
    }
}
