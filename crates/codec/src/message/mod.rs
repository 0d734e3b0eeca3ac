pub mod attributes;
pub mod methods;

use crate::{
    Attributes, Error,
    message::{
        attributes::{Attribute, AttributeType},
        methods::Method,
    },
};

use bytes::{BufMut, BytesMut};

/// Fixed value distinguishing RFC 5389 messages from classic STUN; also
/// the key of the XOR address transform.
pub const MAGIC_COOKIE: u32 = 0x2112A442;

pub struct MessageEncoder<'a> {
    token: &'a [u8; 12],
    bytes: &'a mut BytesMut,
}

impl<'a> MessageEncoder<'a> {
    pub fn new(method: Method, token: &'a [u8; 12], bytes: &'a mut BytesMut) -> Self {
        bytes.clear();
        bytes.put_u16(method.into());
        bytes.put_u16(0);
        bytes.put_u32(MAGIC_COOKIE);
        bytes.put(token.as_slice());

        Self { bytes, token }
    }

    /// rely on old message to create new message.
    ///
    /// # Test
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use stun_probe_codec::message::methods::*;
    /// use stun_probe_codec::message::*;
    /// use stun_probe_codec::*;
    ///
    /// let buffer = [
    ///     0x00u8, 0x01, 0x00, 0x00, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49,
    ///     0x42, 0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b,
    /// ];
    ///
    /// let mut attributes = Attributes::default();
    /// let mut buf = BytesMut::new();
    /// let old = Message::decode(&buffer[..], &mut attributes).unwrap();
    /// MessageEncoder::extend(BINDING_REQUEST, &old, &mut buf);
    ///
    /// assert_eq!(&buf[..], &buffer[..]);
    /// ```
    pub fn extend(method: Method, reader: &Message<'a>, bytes: &'a mut BytesMut) -> Self {
        let token = reader.token();

        bytes.clear();
        bytes.put_u16(method.into());
        bytes.put_u16(0);
        bytes.put_u32(MAGIC_COOKIE);
        bytes.put(token.as_slice());
        Self { bytes, token }
    }

    /// append attribute.
    ///
    /// append attribute to message attribute list. The length field stores
    /// the unpadded value size; the value itself is zero padded to the
    /// next 4-byte boundary.
    ///
    /// # Test
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use stun_probe_codec::message::attributes::*;
    /// use stun_probe_codec::message::methods::*;
    /// use stun_probe_codec::message::*;
    /// use stun_probe_codec::*;
    ///
    /// let buffer = [
    ///     0x00u8, 0x01, 0x00, 0x00, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49,
    ///     0x42, 0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b,
    /// ];
    ///
    /// let new_buf = [
    ///     0x00u8, 0x01, 0x00, 0x00, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49,
    ///     0x42, 0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b, 0x80, 0x22, 0x00,
    ///     0x05, 0x70, 0x61, 0x6e, 0x64, 0x61, 0x00, 0x00, 0x00,
    /// ];
    ///
    /// let mut buf = BytesMut::new();
    /// let mut attributes = Attributes::default();
    /// let old = Message::decode(&buffer[..], &mut attributes).unwrap();
    /// let mut message = MessageEncoder::extend(BINDING_REQUEST, &old, &mut buf);
    ///
    /// message.append::<Software>("panda");
    ///
    /// assert_eq!(&new_buf[..], &buf[..]);
    /// ```
    pub fn append<'c, T: Attribute<'c>>(&'c mut self, value: T::Item) {
        self.bytes.put_u16(T::TYPE as u16);

        // record the current position,
        // and then advance the internal cursor 2 bytes,
        // here is to reserve the position.
        let os = self.bytes.len();
        unsafe { self.bytes.advance_mut(2) }
        T::serialize(value, self.bytes, self.token);

        // compute write index,
        // back to source index write size.
        let size = self.bytes.len() - os - 2;
        let size_buf = (size as u16).to_be_bytes();
        self.bytes[os] = size_buf[0];
        self.bytes[os + 1] = size_buf[1];

        // if you need to padding,
        // padding in the zero bytes.
        let psize = alignment_32(size);
        if psize > 0 {
            self.bytes.put(&[0u8; 10][0..psize]);
        }
    }

    /// write the attribute list size back into the message header.
    ///
    /// # Test
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use stun_probe_codec::message::attributes::*;
    /// use stun_probe_codec::message::methods::*;
    /// use stun_probe_codec::message::*;
    /// use stun_probe_codec::*;
    ///
    /// let buffer = [
    ///     0x00u8, 0x01, 0x00, 0x00, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49,
    ///     0x42, 0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b,
    /// ];
    ///
    /// let mut buf = BytesMut::new();
    /// let mut attributes = Attributes::default();
    /// let old = Message::decode(&buffer[..], &mut attributes).unwrap();
    /// let mut message = MessageEncoder::extend(BINDING_REQUEST, &old, &mut buf);
    ///
    /// message.append::<Software>("panda");
    /// message.flush().unwrap();
    ///
    /// assert_eq!(&buf[2..4], &[0x00, 0x0c]);
    /// ```
    pub fn flush(&mut self) -> Result<(), Error> {
        // write attribute list size.
        self.set_len(self.bytes.len() - 20);
        Ok(())
    }

    // set stun message header size.
    fn set_len(&mut self, len: usize) {
        self.bytes[2..4].copy_from_slice((len as u16).to_be_bytes().as_slice());
    }
}

pub struct Message<'a> {
    /// message method.
    method: Method,
    /// message transaction id.
    token: &'a [u8; 12],
    /// message source bytes.
    bytes: &'a [u8],
    // message attribute list.
    attributes: &'a Attributes,
}

impl<'a> Message<'a> {
    /// message method.
    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    /// message transaction id, always the full 12 bytes.
    #[inline]
    pub fn token(&self) -> &'a [u8; 12] {
        self.token
    }

    /// get attribute.
    ///
    /// get attribute from message attribute list.
    ///
    /// # Test
    ///
    /// ```
    /// use stun_probe_codec::message::attributes::*;
    /// use stun_probe_codec::message::methods::*;
    /// use stun_probe_codec::message::*;
    /// use stun_probe_codec::*;
    ///
    /// let buffer = [
    ///     0x00u8, 0x01, 0x00, 0x00, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49,
    ///     0x42, 0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b,
    /// ];
    ///
    /// let mut attributes = Attributes::default();
    /// let message = Message::decode(&buffer[..], &mut attributes).unwrap();
    ///
    /// assert!(message.get::<Software>().is_none());
    /// ```
    pub fn get<T: Attribute<'a>>(&self) -> Option<T::Item> {
        let range = self.attributes.get(&T::TYPE)?;
        T::deserialize(&self.bytes[range], self.token()).ok()
    }

    /// Gets all the values of an attribute from a list.
    ///
    /// Normally a stun message can have multiple attributes with the same name,
    /// and this function will all the values of the current attribute.
    pub fn get_all<T: Attribute<'a>>(&self) -> impl Iterator<Item = T::Item> {
        self.attributes
            .get_all(&T::TYPE)
            .map(|it| T::deserialize(&self.bytes[it.clone()], self.token()))
            .filter(|it| it.is_ok())
            .flatten()
    }

    /// Unrecognized comprehension-required attribute type codes found
    /// while decoding, in wire order. An empty slice means the message
    /// can be processed as-is; a non-empty one is the caller's cue to
    /// answer with error 420 and an UNKNOWN-ATTRIBUTES attribute.
    #[inline]
    pub fn unknown_comprehension_required(&self) -> &[u16] {
        self.attributes.unknown()
    }

    /// # Test
    ///
    /// ```
    /// use stun_probe_codec::message::attributes::*;
    /// use stun_probe_codec::message::methods::*;
    /// use stun_probe_codec::message::*;
    /// use stun_probe_codec::*;
    ///
    /// let buffer: [u8; 20] = [
    ///     0x00, 0x01, 0x00, 0x00, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49, 0x42,
    ///     0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b,
    /// ];
    ///
    /// let mut attributes = Attributes::default();
    /// let message = Message::decode(&buffer[..], &mut attributes).unwrap();
    ///
    /// assert_eq!(message.method(), BINDING_REQUEST);
    /// assert!(message.get::<Software>().is_none());
    /// ```
    pub fn decode(bytes: &'a [u8], attributes: &'a mut Attributes) -> Result<Self, Error> {
        let len = bytes.len();

        // There must be at least a complete header.
        if len < 20 {
            return Err(Error::MalformedMessage);
        }

        let method = Method::try_from(u16::from_be_bytes(bytes[..2].try_into()?))?;

        // First check whether the message length is valid. Here, the length needs
        // to add the 20 bytes of the header, because the length field here does
        // not include the header length.
        {
            let size = u16::from_be_bytes(bytes[2..4].try_into()?) as usize + 20;
            if len < size {
                return Err(Error::MalformedMessage);
            }
        }

        // Check whether the magic cookie is the same.
        if bytes[4..8] != MAGIC_COOKIE.to_be_bytes() {
            return Err(Error::NotMagicCookie);
        }

        let token: &[u8; 12] = bytes[8..20].try_into()?;

        attributes.clear();

        let mut offset = 20;
        while offset < len {
            // a trailing fragment smaller than an attribute header is a
            // broken message, not a clean end.
            if len - offset < 4 {
                return Err(Error::TruncatedAttribute);
            }

            // get attribute type
            let key = u16::from_be_bytes([bytes[offset], bytes[offset + 1]]);

            // get attribute size
            let size = u16::from_be_bytes([bytes[offset + 2], bytes[offset + 3]]) as usize;

            // check if the attribute length has overflowed.
            offset += 4;
            if len - offset < size {
                return Err(Error::TruncatedAttribute);
            }

            // body range.
            let range = offset..(offset + size);

            // if there are padding bytes,
            // skip padding size.
            if size > 0 {
                offset += size + alignment_32(size);
            }

            // padding may run past the end when the last value is unpadded.
            if offset > len {
                offset = len;
            }

            match AttributeType::from_code(key) {
                Some(kind) => attributes.append(kind, range),
                // unrecognized comprehension-required types are recorded,
                // comprehension-optional ones are skipped.
                None if key < 0x8000 => attributes.append_unknown(key),
                None => (),
            }
        }

        Ok(Self {
            attributes,
            method,
            token,
            bytes,
        })
    }

    /// # Test
    ///
    /// ```
    /// use stun_probe_codec::message::*;
    ///
    /// let buffer: [u8; 20] = [
    ///     0x00, 0x01, 0x00, 0x00, 0x21, 0x12, 0xa4, 0x42, 0x72, 0x6d, 0x49, 0x42,
    ///     0x72, 0x52, 0x64, 0x48, 0x57, 0x62, 0x4b, 0x2b,
    /// ];
    ///
    /// let size = Message::message_size(&buffer[..]).unwrap();
    ///
    /// assert_eq!(size, 20);
    /// ```
    pub fn message_size(buffer: &[u8]) -> Result<usize, Error> {
        if buffer.len() < 20 || buffer[0] >> 6 != 0 {
            return Err(Error::MalformedMessage);
        }

        Ok((u16::from_be_bytes(buffer[2..4].try_into()?) + 20) as usize)
    }
}

/// compute padding size.
///
/// RFC5389 stipulates that the attribute content is a multiple of 4.
///
/// # Test
///
/// ```
/// use stun_probe_codec::message::alignment_32;
///
/// assert_eq!(alignment_32(4), 0);
/// assert_eq!(alignment_32(0), 0);
/// assert_eq!(alignment_32(5), 3);
/// ```
#[inline(always)]
pub fn alignment_32(size: usize) -> usize {
    let range = size % 4;
    if size == 0 || range == 0 {
        return 0;
    }

    4 - range
}
