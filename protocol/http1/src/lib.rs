//! Incremental HTTP/1.x message decoding.
//!
//! This crate parses request or response traffic from a byte stream fed in
//! arbitrary slices. The decoder is a resumable state machine: when input
//! runs out mid-line or mid-body it parks and resumes on the next call
//! without losing or duplicating bytes, which makes it suitable for
//! embedding in an asynchronous I/O pipeline. Body bytes are emitted as
//! zero-copy slices of the input buffer.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use protocol_http1::{Event, MessageHead, RequestDecoder, RequestFactory};
//!
//! let mut decoder = RequestDecoder::new(RequestFactory);
//! let mut input = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n"[..]);
//! let mut events = Vec::new();
//!
//! decoder.decode(&mut input, &mut events);
//!
//! match &events[0] {
//!     Event::Head(head) => assert_eq!(head.method(), b"GET"),
//!     other => panic!("expected a message head, got {other:?}"),
//! }
//! assert!(matches!(&events[1], Event::LastContent { .. }));
//! ```
//!
//! Chunked, fixed-length, and connection-terminated body framings are
//! supported, with trailers on chunked messages. Limits on the initial
//! line, the header block, and emitted chunk sizes are set through
//! [`DecoderConfig`].

mod config;
mod decode;
mod error;
mod headers;
mod message;
mod scanner;

pub use config::DecoderConfig;
pub use decode::{Event, Http1Decoder, RequestDecoder, ResponseDecoder};
pub use error::DecodeError;
pub use headers::HeaderMap;
pub use message::{
    MessageFactory, MessageHead, RequestFactory, RequestHead, ResponseFactory, ResponseHead,
    Version,
};
