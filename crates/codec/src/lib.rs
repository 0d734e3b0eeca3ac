//! ## Session Traversal Utilities for NAT (STUN)
//!
//! [RFC5389]: https://tools.ietf.org/html/rfc5389
//! [RFC5780]: https://tools.ietf.org/html/rfc5780
//!
//! STUN is intended to be used in the context of one or more NAT
//! traversal solutions.  These solutions are known as "STUN Usages".
//! Each usage describes how STUN is utilized to achieve the NAT
//! traversal solution.  This crate implements the wire codec shared by
//! every usage: the 20-byte message header, the TLV attribute list with
//! its 4-byte alignment rules, and the typed attributes needed for
//! binding requests and NAT behavior discovery ([RFC5389], [RFC5780]).
//!
//! ### STUN Message Structure
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |0 0|     STUN Message Type     |         Message Length        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         Magic Cookie                          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                                                               |
//! |                     Transaction ID (96 bits)                  |
//! |                                                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! ### STUN Attributes
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |         Type                  |            Length             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         Value (variable)                ....
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

pub mod message;

use std::{array::TryFromSliceError, ops::Range, str::Utf8Error};

use crate::message::attributes::AttributeType;

#[derive(Debug)]
pub enum Error {
    /// The buffer is too short for a message header, or the buffer is
    /// shorter than the header's declared message length.
    MalformedMessage,
    /// An attribute header or a declared attribute value overruns the
    /// end of the buffer.
    TruncatedAttribute,
    /// A field value is outside its legal range, e.g. an error code
    /// outside 300..=699.
    OutOfRange,
    UnknownMethod,
    UnknownAddressFamily,
    NotMagicCookie,
    Utf8Error(Utf8Error),
    TryFromSliceError(TryFromSliceError),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<Utf8Error> for Error {
    fn from(value: Utf8Error) -> Self {
        Self::Utf8Error(value)
    }
}

impl From<TryFromSliceError> for Error {
    fn from(value: TryFromSliceError) -> Self {
        Self::TryFromSliceError(value)
    }
}

/// A cache of the attribute list of a decoded message.
///
/// Keeping the cache outside the message lets a dispatch loop reuse one
/// allocation across packets. Unrecognized comprehension-required type
/// codes are collected separately; they never enter the attribute list.
#[derive(Debug, Clone)]
pub struct Attributes {
    attributes: Vec<(AttributeType, Range<usize>)>,
    unknown: Vec<u16>,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            attributes: Vec::with_capacity(10),
            unknown: Vec::new(),
        }
    }
}

impl Attributes {
    /// Adds an attribute to the list.
    pub fn append(&mut self, kind: AttributeType, range: Range<usize>) {
        self.attributes.push((kind, range));
    }

    /// Records an unrecognized comprehension-required type code.
    pub fn append_unknown(&mut self, kind: u16) {
        self.unknown.push(kind);
    }

    /// Gets an attribute from the list.
    ///
    /// Note: This function will only look for the first matching
    /// attribute in the list and return it.
    pub fn get(&self, kind: &AttributeType) -> Option<Range<usize>> {
        self.attributes
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, v)| v.clone())
    }

    /// Gets all the values of an attribute from the list, in wire order.
    pub fn get_all<'a>(
        &'a self,
        kind: &'a AttributeType,
    ) -> impl Iterator<Item = &'a Range<usize>> {
        self.attributes
            .iter()
            .filter(move |(k, _)| k == kind)
            .map(|(_, v)| v)
    }

    /// Unrecognized comprehension-required type codes, in wire order.
    pub fn unknown(&self) -> &[u16] {
        &self.unknown
    }

    pub fn clear(&mut self) {
        if !self.attributes.is_empty() {
            self.attributes.clear();
        }

        if !self.unknown.is_empty() {
            self.unknown.clear();
        }
    }
}
