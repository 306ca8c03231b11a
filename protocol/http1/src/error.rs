//! Decoder errors.

/// Decoding failures.
///
/// Most of these are carried on an invalid-message or invalid-content event
/// rather than returned: the decoder swallows the rest of the input and
/// reports the failure in-band so the surrounding connection can close.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// An HTTP line exceeded `max_initial_line_length`.
    #[error("an HTTP line is larger than {limit} bytes")]
    LineTooLong { limit: usize },
    /// A header block (or trailer block) exceeded `max_header_size`.
    #[error("HTTP header is larger than {limit} bytes")]
    HeaderTooLong { limit: usize },
    /// The initial line named a protocol version this decoder cannot parse.
    #[error("invalid HTTP version")]
    InvalidVersion,
    /// The status line carried a malformed status code.
    #[error("invalid HTTP status code")]
    InvalidStatus,
    /// A header name was empty or contained an illegal byte.
    #[error("invalid HTTP header name")]
    InvalidHeaderName,
    /// Content-Length was unparseable, negative, or self-contradictory.
    #[error("invalid Content-Length header")]
    InvalidContentLength,
    /// A chunk-size line was not a hexadecimal integer.
    #[error("invalid chunk size")]
    InvalidChunkSize,
    /// The peer sent chunked transfer encoding but support is disabled.
    #[error("chunked transfer encoding is not supported")]
    UnsupportedChunked,
    /// The connection closed in the middle of a header block.
    #[error("connection closed before headers were received")]
    ClosedBeforeHeaders,
}
