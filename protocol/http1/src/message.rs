//! Message heads and the construction seam between decoder and caller.
//!
//! The decoder does not know what a request or response object looks like;
//! it drives a [`MessageFactory`] to build heads from parsed initial lines
//! and to answer the questions body framing depends on. The concrete
//! [`RequestFactory`] and [`ResponseFactory`] cover plain HTTP; an embedder
//! with its own message types supplies its own factory.

use crate::error::DecodeError;
use crate::headers::{self, HeaderMap};

/// An HTTP protocol version, as parsed from `HTTP/<major>.<minor>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const HTTP_10: Version = Version { major: 1, minor: 0 };
    pub const HTTP_11: Version = Version { major: 1, minor: 1 };

    /// Parse `HTTP/x.y`.
    pub fn parse(text: &[u8]) -> Result<Self, DecodeError> {
        let text = headers::trim(text);
        match text {
            [b'H', b'T', b'T', b'P', b'/', major, b'.', minor]
                if major.is_ascii_digit() && minor.is_ascii_digit() =>
            {
                Ok(Version {
                    major: major - b'0',
                    minor: minor - b'0',
                })
            }
            _ => Err(DecodeError::InvalidVersion),
        }
    }
}

/// The head of a decoded message: initial line plus headers, and a failure
/// stamp for messages that could not be fully decoded.
pub trait MessageHead {
    fn headers(&self) -> &HeaderMap;
    fn headers_mut(&mut self) -> &mut HeaderMap;
    /// Mark this message as the product of a failed decode.
    fn set_failure(&mut self, error: DecodeError);
    /// The failure this message was stamped with, if any.
    fn failure(&self) -> Option<&DecodeError>;
}

/// Capability the decoder needs to build and classify messages.
pub trait MessageFactory {
    type Head: MessageHead;

    /// Build a head from the three whitespace-delimited initial-line fields.
    fn create(&self, first: &[u8], second: &[u8], third: &[u8])
        -> Result<Self::Head, DecodeError>;

    /// Build a placeholder head for input that never yielded a valid
    /// initial line.
    fn create_invalid(&self) -> Self::Head;

    /// True when this decoder parses requests rather than responses.
    fn decoding_request(&self) -> bool;

    /// True when the message can never carry a body, regardless of framing
    /// headers.
    fn content_always_empty(&self, head: &Self::Head) -> bool;
}

/// A decoded request line plus headers.
#[derive(Debug, Clone)]
pub struct RequestHead {
    method: Vec<u8>,
    uri: Vec<u8>,
    version: Version,
    headers: HeaderMap,
    failure: Option<DecodeError>,
}

impl RequestHead {
    pub fn method(&self) -> &[u8] {
        &self.method
    }

    pub fn uri(&self) -> &[u8] {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

impl MessageHead for RequestHead {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn set_failure(&mut self, error: DecodeError) {
        self.failure = Some(error);
    }

    fn failure(&self) -> Option<&DecodeError> {
        self.failure.as_ref()
    }
}

/// A decoded status line plus headers.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    version: Version,
    status: u16,
    reason: Vec<u8>,
    headers: HeaderMap,
    failure: Option<DecodeError>,
}

impl ResponseHead {
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &[u8] {
        &self.reason
    }
}

impl MessageHead for ResponseHead {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn set_failure(&mut self, error: DecodeError) {
        self.failure = Some(error);
    }

    fn failure(&self) -> Option<&DecodeError> {
        self.failure.as_ref()
    }
}

/// Factory for request decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFactory;

impl MessageFactory for RequestFactory {
    type Head = RequestHead;

    fn create(
        &self,
        first: &[u8],
        second: &[u8],
        third: &[u8],
    ) -> Result<RequestHead, DecodeError> {
        Ok(RequestHead {
            method: first.to_vec(),
            uri: second.to_vec(),
            version: Version::parse(third)?,
            headers: HeaderMap::new(),
            failure: None,
        })
    }

    fn create_invalid(&self) -> RequestHead {
        RequestHead {
            method: b"GET".to_vec(),
            uri: b"/bad-request".to_vec(),
            version: Version::HTTP_10,
            headers: HeaderMap::new(),
            failure: None,
        }
    }

    fn decoding_request(&self) -> bool {
        true
    }

    fn content_always_empty(&self, _head: &RequestHead) -> bool {
        false
    }
}

/// Factory for response decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFactory;

impl MessageFactory for ResponseFactory {
    type Head = ResponseHead;

    fn create(
        &self,
        first: &[u8],
        second: &[u8],
        third: &[u8],
    ) -> Result<ResponseHead, DecodeError> {
        Ok(ResponseHead {
            version: Version::parse(first)?,
            status: parse_status(second)?,
            reason: third.to_vec(),
            headers: HeaderMap::new(),
            failure: None,
        })
    }

    fn create_invalid(&self) -> ResponseHead {
        ResponseHead {
            version: Version::HTTP_10,
            status: 999,
            reason: b"Unknown".to_vec(),
            headers: HeaderMap::new(),
            failure: None,
        }
    }

    fn decoding_request(&self) -> bool {
        false
    }

    /// 1xx, 204, and 304 responses never carry a body. The exception is a
    /// 101 with an Upgrade header and no Sec-WebSocket-Accept, which some
    /// legacy WebSocket handshakes follow with payload bytes.
    fn content_always_empty(&self, head: &ResponseHead) -> bool {
        match head.status {
            100..=199 => {
                !(head.status == 101
                    && !head.headers.contains(b"sec-websocket-accept")
                    && head.headers.contains(b"upgrade"))
            }
            204 | 304 => true,
            _ => false,
        }
    }
}

fn parse_status(text: &[u8]) -> Result<u16, DecodeError> {
    let text = headers::trim(text);
    if text.len() != 3 || !text.iter().all(u8::is_ascii_digit) {
        return Err(DecodeError::InvalidStatus);
    }
    Ok(text.iter().fold(0u16, |acc, &b| acc * 10 + (b - b'0') as u16))
}
