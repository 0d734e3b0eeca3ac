use crate::Error;

/// STUN Methods Registry
///
/// [RFC5389]: https://datatracker.ietf.org/doc/html/rfc5389
/// [RFC8126]: https://datatracker.ietf.org/doc/html/rfc8126
/// [Section 6]: https://datatracker.ietf.org/doc/html/rfc5389#section-6
///
/// A STUN method is a hex number in the range 0x000-0x0FF.  The encoding
/// of a STUN method into a STUN message is described in [Section 6].
///
/// STUN methods in the range 0x000-0x07F are assigned by IETF Review
/// [RFC8126].  Binding (0x001) is the only method this crate handles;
/// every other codepoint decodes to [`Error::UnknownMethod`].
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum MethodType {
    Request,
    Response,
    Error,
}

#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Method {
    Binding(MethodType),
}

pub const BINDING_REQUEST: Method = Method::Binding(MethodType::Request);
pub const BINDING_RESPONSE: Method = Method::Binding(MethodType::Response);
pub const BINDING_ERROR: Method = Method::Binding(MethodType::Error);

impl Method {
    pub fn is_error(&self) -> bool {
        matches!(self, Method::Binding(MethodType::Error))
    }

    /// the error response form of this method, whatever its type.
    ///
    /// # Test
    ///
    /// ```
    /// use stun_probe_codec::message::methods::*;
    ///
    /// assert_eq!(BINDING_REQUEST.error(), BINDING_ERROR);
    /// assert!(BINDING_REQUEST.error().is_error());
    /// ```
    pub fn error(&self) -> Method {
        match self {
            Method::Binding(_) => BINDING_ERROR,
        }
    }
}

impl TryFrom<u16> for Method {
    type Error = Error;

    /// # Test
    ///
    /// ```
    /// use stun_probe_codec::message::methods::*;
    ///
    /// assert_eq!(Method::try_from(0x0001).unwrap(), BINDING_REQUEST);
    /// assert_eq!(Method::try_from(0x0101).unwrap(), BINDING_RESPONSE);
    /// assert_eq!(Method::try_from(0x0111).unwrap(), BINDING_ERROR);
    /// assert!(Method::try_from(0x0003).is_err());
    /// ```
    fn try_from(value: u16) -> Result<Self, Error> {
        Ok(match value {
            0x0001 => Self::Binding(MethodType::Request),
            0x0101 => Self::Binding(MethodType::Response),
            0x0111 => Self::Binding(MethodType::Error),
            _ => return Err(Error::UnknownMethod),
        })
    }
}

impl From<Method> for u16 {
    /// # Test
    ///
    /// ```
    /// use stun_probe_codec::message::methods::*;
    ///
    /// assert_eq!(0x0001u16, u16::from(BINDING_REQUEST));
    /// assert_eq!(0x0101u16, u16::from(BINDING_RESPONSE));
    /// assert_eq!(0x0111u16, u16::from(BINDING_ERROR));
    /// ```
    fn from(value: Method) -> Self {
        match value {
            Method::Binding(MethodType::Request) => 0x0001,
            Method::Binding(MethodType::Response) => 0x0101,
            Method::Binding(MethodType::Error) => 0x0111,
        }
    }
}
