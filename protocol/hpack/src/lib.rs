//! HPACK header compression for HTTP/2 (RFC 7541) — encoding side.
//!
//! This crate compresses header blocks for transmission. It keeps the
//! encoder's dynamic table in lockstep with what the peer's decoder
//! reconstructs, chooses between indexed and literal representations per
//! header, and Huffman-codes string literals whenever that is a strict win.
//! Decoding is out of scope; the peer (or a separate crate) handles it.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use protocol_hpack::{HeaderField, HpackEncoder};
//!
//! let mut encoder = HpackEncoder::new();
//! let mut buf = BytesMut::new();
//!
//! let headers = vec![HeaderField::new(b":method".to_vec(), b"GET".to_vec())];
//! encoder
//!     .encode_header_block(1, &mut buf, &headers, |_, _| false)
//!     .unwrap();
//!
//! // ":method: GET" is static table entry 2.
//! assert_eq!(&buf[..], &[0x82]);
//! ```
//!
//! Sensitive headers (passwords, tokens) are classified by the caller's
//! predicate and transmitted never-indexed so no table — here or in any
//! intermediary — retains them.

mod encode;
mod huffman;
mod integer;
mod table;

pub use encode::{
    EncodeError, EncoderOptions, HpackEncoder, DEFAULT_HEADER_TABLE_SIZE, MAX_HEADER_LIST_SIZE,
    MAX_HEADER_TABLE_SIZE,
};
pub use table::{HeaderField, StaticTable};
