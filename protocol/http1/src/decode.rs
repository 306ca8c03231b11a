//! Incremental HTTP/1.x message decoding.

use bytes::{Buf, Bytes, BytesMut};
use tracing::debug;

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::headers::{self, HeaderMap};
use crate::message::{MessageFactory, MessageHead, RequestFactory, ResponseFactory};
use crate::scanner::{HeaderScanner, LineScanner};

/// Decoder output events.
///
/// A complete message is always emitted as `Head`, zero or more `Content`
/// chunks in byte order, then exactly one `LastContent`.
#[derive(Debug)]
pub enum Event<H> {
    /// A fully parsed initial line and header block.
    Head(H),
    /// A slice of body content.
    Content(Bytes),
    /// End of body, carrying the final content slice and any trailers.
    LastContent { content: Bytes, trailers: HeaderMap },
    /// A message that failed to decode, stamped with the failure.
    InvalidMessage(H),
    /// Body decoding failed mid-message.
    InvalidContent(DecodeError),
    /// Opaque bytes forwarded after the protocol has switched.
    Upgraded(Bytes),
}

impl<H> Event<H> {
    fn empty_last() -> Self {
        Event::LastContent {
            content: Bytes::new(),
            trailers: HeaderMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SkipControlChars,
    ReadInitial,
    ReadHeader,
    ReadFixedLengthContent,
    ReadVariableLengthContent,
    ReadChunkSize,
    ReadChunkedContent,
    ReadChunkDelimiter,
    ReadChunkFooter,
    BadMessage,
    Upgraded,
}

/// How the body of the current message is framed, decided at the end of
/// the header block.
enum Framing {
    /// The message kind never has a body.
    AlwaysEmpty,
    /// Chunked transfer encoding.
    Chunked,
    /// No body: zero length, or a request without one.
    Empty,
    /// Exactly this many body bytes follow.
    Fixed(u64),
    /// Body runs until the connection closes.
    Variable,
}

/// Outcome of an initial-line parse.
enum InitialLine {
    /// Not enough input yet.
    Parked,
    /// Line did not have three fields; skipped.
    Dropped,
    /// A message head was constructed.
    Message,
}

/// Resumable HTTP/1.x decoder.
///
/// Feed input with [`decode`]; events accumulate into the caller's vec.
/// When input runs out mid-element the decoder parks with its cursor and
/// state intact and resumes on the next call, so any split of the byte
/// stream yields the same messages. Body bytes are taken as zero-copy
/// slices of the input buffer.
///
/// A decoder instance belongs to one connection and must not be shared
/// across threads.
///
/// [`decode`]: Http1Decoder::decode
pub struct Http1Decoder<F: MessageFactory> {
    factory: F,
    max_chunk_size: usize,
    chunked_supported: bool,
    validate_headers: bool,
    state: State,
    message: Option<F::Head>,
    /// Cached Content-Length: `None` until computed, `-1` when absent.
    content_length: Option<i64>,
    /// Remaining bytes of the current fixed body or chunk.
    chunk_size: u64,
    /// Whether the in-progress message uses chunked framing.
    body_chunked: bool,
    line_scanner: LineScanner,
    header_scanner: HeaderScanner,
    /// Header currently being assembled, pending possible continuations.
    header_name: Option<Vec<u8>>,
    header_value: Option<Vec<u8>>,
    trailers: Option<HeaderMap>,
    last_trailer_name: Option<Vec<u8>>,
    reset_requested: bool,
}

/// Decoder for HTTP requests.
pub type RequestDecoder = Http1Decoder<RequestFactory>;

/// Decoder for HTTP responses.
pub type ResponseDecoder = Http1Decoder<ResponseFactory>;

impl<F: MessageFactory> Http1Decoder<F> {
    /// Create a decoder with default limits.
    pub fn new(factory: F) -> Self {
        Self::with_config(factory, DecoderConfig::default())
    }

    /// Create a decoder with explicit limits.
    pub fn with_config(factory: F, config: DecoderConfig) -> Self {
        Self {
            line_scanner: LineScanner::new(
                config.max_initial_line_length(),
                config.initial_buffer_size(),
            ),
            header_scanner: HeaderScanner::new(
                config.max_header_size(),
                config.initial_buffer_size(),
            ),
            max_chunk_size: config.max_chunk_size(),
            chunked_supported: config.chunked_supported(),
            validate_headers: config.validate_headers(),
            factory,
            state: State::SkipControlChars,
            message: None,
            content_length: None,
            chunk_size: 0,
            body_chunked: false,
            header_name: None,
            header_value: None,
            trailers: None,
            last_trailer_name: None,
            reset_requested: false,
        }
    }

    /// Request a reset. Applied at the next [`decode`] or [`decode_last`]
    /// entry rather than immediately, so an in-flight message cannot emit
    /// two terminators.
    ///
    /// [`decode`]: Http1Decoder::decode
    /// [`decode_last`]: Http1Decoder::decode_last
    pub fn reset(&mut self) {
        self.reset_requested = true;
    }

    /// Notification that an Expect precondition failed upstream. Flags a
    /// reset only while a body is being read.
    pub fn expectation_failed(&mut self) {
        match self.state {
            State::ReadFixedLengthContent
            | State::ReadVariableLengthContent
            | State::ReadChunkSize => self.reset(),
            _ => {}
        }
    }

    /// Switch to opaque pass-through. The surrounding pipeline calls this
    /// once it has negotiated a different protocol; every remaining byte is
    /// forwarded untouched until this codec is discarded.
    pub fn upgraded(&mut self) {
        self.state = State::Upgraded;
    }

    /// Consume as much of `input` as possible, appending events to `out`.
    ///
    /// Returns without emitting when more input is needed; state and the
    /// read cursor are positioned so the next call continues where this
    /// one stopped.
    pub fn decode(&mut self, input: &mut BytesMut, out: &mut Vec<Event<F::Head>>) {
        if self.reset_requested {
            self.reset_now();
        }

        loop {
            match self.state {
                State::SkipControlChars => {
                    if !skip_control_chars(input) {
                        return;
                    }
                    self.state = State::ReadInitial;
                }
                State::ReadInitial => match self.read_initial(input) {
                    Ok(InitialLine::Parked) => return,
                    Ok(InitialLine::Dropped) => self.state = State::SkipControlChars,
                    Ok(InitialLine::Message) => self.state = State::ReadHeader,
                    Err(error) => {
                        self.invalid_message(input, out, error);
                        return;
                    }
                },
                State::ReadHeader => {
                    let Some(mut head) = self.message.take() else {
                        self.state = State::BadMessage;
                        continue;
                    };
                    match self.read_headers(input, &mut head) {
                        Ok(None) => {
                            self.message = Some(head);
                            return;
                        }
                        Ok(Some(Framing::AlwaysEmpty)) => {
                            headers::clear_transfer_encoding_chunked(head.headers_mut());
                            out.push(Event::Head(head));
                            out.push(Event::empty_last());
                            self.reset_now();
                        }
                        Ok(Some(Framing::Chunked)) => {
                            if !self.chunked_supported {
                                self.message = Some(head);
                                self.invalid_message(input, out, DecodeError::UnsupportedChunked);
                                return;
                            }
                            out.push(Event::Head(head));
                            self.state = State::ReadChunkSize;
                        }
                        Ok(Some(Framing::Empty)) => {
                            out.push(Event::Head(head));
                            out.push(Event::empty_last());
                            self.reset_now();
                        }
                        Ok(Some(Framing::Fixed(length))) => {
                            out.push(Event::Head(head));
                            self.chunk_size = length;
                            self.state = State::ReadFixedLengthContent;
                        }
                        Ok(Some(Framing::Variable)) => {
                            out.push(Event::Head(head));
                            self.state = State::ReadVariableLengthContent;
                        }
                        Err(error) => {
                            self.message = Some(head);
                            self.invalid_message(input, out, error);
                            return;
                        }
                    }
                }
                State::ReadFixedLengthContent => {
                    if input.is_empty() {
                        return;
                    }
                    let to_read = (input.len() as u64)
                        .min(self.max_chunk_size as u64)
                        .min(self.chunk_size) as usize;
                    let content = input.split_to(to_read).freeze();
                    self.chunk_size -= to_read as u64;
                    if self.chunk_size == 0 {
                        out.push(Event::LastContent {
                            content,
                            trailers: HeaderMap::new(),
                        });
                        self.reset_now();
                    } else {
                        out.push(Event::Content(content));
                    }
                }
                State::ReadVariableLengthContent => {
                    if input.is_empty() {
                        return;
                    }
                    let to_read = input.len().min(self.max_chunk_size);
                    out.push(Event::Content(input.split_to(to_read).freeze()));
                }
                State::ReadChunkSize => {
                    match self.line_scanner.parse(input) {
                        Ok(None) => return,
                        Ok(Some(())) => {}
                        Err(error) => {
                            self.invalid_chunk(input, out, error);
                            return;
                        }
                    }
                    match parse_chunk_size(self.line_scanner.content()) {
                        Ok(0) => self.state = State::ReadChunkFooter,
                        Ok(size) => {
                            self.chunk_size = size;
                            self.state = State::ReadChunkedContent;
                        }
                        Err(error) => {
                            self.invalid_chunk(input, out, error);
                            return;
                        }
                    }
                }
                State::ReadChunkedContent => {
                    if input.is_empty() {
                        return;
                    }
                    let to_read = (input.len() as u64)
                        .min(self.max_chunk_size as u64)
                        .min(self.chunk_size) as usize;
                    let content = input.split_to(to_read).freeze();
                    self.chunk_size -= to_read as u64;
                    out.push(Event::Content(content));
                    if self.chunk_size == 0 {
                        self.state = State::ReadChunkDelimiter;
                    }
                }
                State::ReadChunkDelimiter => match input.iter().position(|&b| b == b'\n') {
                    Some(i) => {
                        input.advance(i + 1);
                        self.state = State::ReadChunkSize;
                    }
                    None => {
                        input.clear();
                        return;
                    }
                },
                State::ReadChunkFooter => match self.read_trailing_headers(input) {
                    Ok(None) => return,
                    Ok(Some(trailers)) => {
                        out.push(Event::LastContent {
                            content: Bytes::new(),
                            trailers,
                        });
                        self.reset_now();
                    }
                    Err(error) => {
                        self.invalid_chunk(input, out, error);
                        return;
                    }
                },
                State::BadMessage => {
                    // Drain and discard until the pipeline drops us.
                    input.clear();
                    return;
                }
                State::Upgraded => {
                    if !input.is_empty() {
                        let len = input.len();
                        out.push(Event::Upgraded(input.split_to(len).freeze()));
                    }
                    return;
                }
            }
        }
    }

    /// Like [`decode`], then settles any message the closing connection
    /// left unfinished.
    ///
    /// [`decode`]: Http1Decoder::decode
    pub fn decode_last(&mut self, input: &mut BytesMut, out: &mut Vec<Event<F::Head>>) {
        self.decode(input, out);
        if self.reset_requested {
            self.reset_now();
        }
        if !self.message_in_progress() {
            return;
        }

        let chunked = self.body_chunked;
        if self.state == State::ReadVariableLengthContent && input.is_empty() && !chunked {
            // Connection-terminated body: the close is the terminator.
            out.push(Event::empty_last());
            self.reset_now();
            return;
        }

        if self.state == State::ReadHeader {
            if let Some(mut head) = self.message.take() {
                head.set_failure(DecodeError::ClosedBeforeHeaders);
                out.push(Event::InvalidMessage(head));
            }
            self.reset_now();
            return;
        }

        let premature = self.factory.decoding_request()
            || chunked
            || self.content_length.unwrap_or(-1) > 0;
        if !premature {
            out.push(Event::empty_last());
        }
        self.reset_now();
    }

    fn message_in_progress(&self) -> bool {
        match self.state {
            State::ReadHeader => self.message.is_some(),
            State::ReadFixedLengthContent
            | State::ReadVariableLengthContent
            | State::ReadChunkSize
            | State::ReadChunkedContent
            | State::ReadChunkDelimiter
            | State::ReadChunkFooter => true,
            _ => false,
        }
    }

    fn read_initial(&mut self, input: &mut BytesMut) -> Result<InitialLine, DecodeError> {
        if self.line_scanner.parse(input)?.is_none() {
            return Ok(InitialLine::Parked);
        }
        let line = self.line_scanner.content();
        let Some((first, second, third)) = split_initial_line(line) else {
            return Ok(InitialLine::Dropped);
        };
        let head = self.factory.create(first, second, third)?;
        self.message = Some(head);
        Ok(InitialLine::Message)
    }

    fn read_headers(
        &mut self,
        input: &mut BytesMut,
        head: &mut F::Head,
    ) -> Result<Option<Framing>, DecodeError> {
        loop {
            if self.header_scanner.parse(input)?.is_none() {
                return Ok(None);
            }
            let line = self.header_scanner.content();
            if line.is_empty() {
                break;
            }

            let first = line[0];
            if (first == b' ' || first == b'\t') && self.header_name.is_some() {
                // Obsolete line folding: the continuation extends the
                // previous value with a single space.
                let folded = headers::trim(line).to_vec();
                if let Some(value) = self.header_value.as_mut() {
                    value.push(b' ');
                    value.extend_from_slice(&folded);
                }
            } else {
                if let Some(name) = self.header_name.take() {
                    let value = self.header_value.take().unwrap_or_default();
                    head.headers_mut().insert(name, value);
                }
                let (name, value) = split_header(line, self.validate_headers)?;
                self.header_name = Some(name);
                self.header_value = Some(value);
            }
        }

        if let Some(name) = self.header_name.take() {
            let value = self.header_value.take().unwrap_or_default();
            head.headers_mut().insert(name, value);
        }

        if self.factory.content_always_empty(head) {
            return Ok(Some(Framing::AlwaysEmpty));
        }
        if headers::is_transfer_encoding_chunked(head.headers()) {
            self.body_chunked = true;
            return Ok(Some(Framing::Chunked));
        }

        let length = content_length(head.headers())?;
        self.content_length = Some(length);
        if length == 0 || (length == -1 && self.factory.decoding_request()) {
            return Ok(Some(Framing::Empty));
        }
        if length > 0 {
            Ok(Some(Framing::Fixed(length as u64)))
        } else {
            Ok(Some(Framing::Variable))
        }
    }

    fn read_trailing_headers(
        &mut self,
        input: &mut BytesMut,
    ) -> Result<Option<HeaderMap>, DecodeError> {
        loop {
            if self.header_scanner.parse(input)?.is_none() {
                return Ok(None);
            }
            let line = self.header_scanner.content();
            if line.is_empty() {
                self.last_trailer_name = None;
                return Ok(Some(self.trailers.take().unwrap_or_default()));
            }

            let first = line[0];
            if first == b' ' || first == b'\t' {
                // A continuation of a discarded trailer finds no stored
                // value and is discarded with it.
                let folded = headers::trim(line).to_vec();
                if let (Some(name), Some(trailers)) =
                    (self.last_trailer_name.as_ref(), self.trailers.as_mut())
                {
                    if let Some(value) = trailers.last_value_mut(name) {
                        value.push(b' ');
                        value.extend_from_slice(&folded);
                    }
                }
            } else {
                let (name, value) = split_header(line, self.validate_headers)?;
                // Framing headers may not be renegotiated from a trailer.
                let forbidden = name.eq_ignore_ascii_case(b"content-length")
                    || name.eq_ignore_ascii_case(b"transfer-encoding")
                    || name.eq_ignore_ascii_case(b"trailer");
                if !forbidden {
                    self.trailers
                        .get_or_insert_with(HeaderMap::new)
                        .insert(name.clone(), value);
                }
                self.last_trailer_name = Some(name);
            }
        }
    }

    fn invalid_message(
        &mut self,
        input: &mut BytesMut,
        out: &mut Vec<Event<F::Head>>,
        error: DecodeError,
    ) {
        debug!(error = %error, "invalid message, discarding remaining input");
        self.state = State::BadMessage;
        input.clear();
        let mut head = self
            .message
            .take()
            .unwrap_or_else(|| self.factory.create_invalid());
        head.set_failure(error);
        out.push(Event::InvalidMessage(head));
    }

    fn invalid_chunk(
        &mut self,
        input: &mut BytesMut,
        out: &mut Vec<Event<F::Head>>,
        error: DecodeError,
    ) {
        debug!(error = %error, "invalid chunk, discarding remaining input");
        self.state = State::BadMessage;
        input.clear();
        self.message = None;
        out.push(Event::InvalidContent(error));
    }

    fn reset_now(&mut self) {
        self.message = None;
        self.header_name = None;
        self.header_value = None;
        self.content_length = None;
        self.chunk_size = 0;
        self.body_chunked = false;
        self.line_scanner.reset();
        self.header_scanner.reset();
        self.trailers = None;
        self.last_trailer_name = None;
        self.reset_requested = false;
        self.state = State::SkipControlChars;
    }
}

/// Advance past leading control and whitespace bytes. Returns false when
/// the input ran out before a significant byte.
fn skip_control_chars(input: &mut BytesMut) -> bool {
    while let Some(&b) = input.first() {
        if b == b' ' || b.is_ascii_control() || (0x80..=0x9f).contains(&b) {
            input.advance(1);
        } else {
            return true;
        }
    }
    false
}

/// Split an initial line into its three whitespace-delimited fields. The
/// third field runs to the end of the line so a reason phrase keeps its
/// internal spaces.
fn split_initial_line(line: &[u8]) -> Option<(&[u8], &[u8], &[u8])> {
    let a_start = find_non_whitespace(line, 0);
    let a_end = find_whitespace(line, a_start);
    let b_start = find_non_whitespace(line, a_end);
    let b_end = find_whitespace(line, b_start);
    let c_start = find_non_whitespace(line, b_end);
    let c_end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(c_start, |i| i + 1);

    if a_start == a_end || b_start == b_end || c_start >= c_end {
        return None;
    }
    Some((
        &line[a_start..a_end],
        &line[b_start..b_end],
        &line[c_start..c_end],
    ))
}

fn find_non_whitespace(line: &[u8], from: usize) -> usize {
    line[from..]
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map_or(line.len(), |i| from + i)
}

fn find_whitespace(line: &[u8], from: usize) -> usize {
    line[from..]
        .iter()
        .position(|b| b.is_ascii_whitespace())
        .map_or(line.len(), |i| from + i)
}

/// Split a header line at the first colon. The name is everything up to
/// the first colon or whitespace; the value is the trimmed remainder after
/// the colon.
fn split_header(line: &[u8], validate: bool) -> Result<(Vec<u8>, Vec<u8>), DecodeError> {
    let name_start = find_non_whitespace(line, 0);
    let mut name_end = name_start;
    while name_end < line.len() {
        let b = line[name_end];
        if b == b':' || b <= b' ' {
            break;
        }
        name_end += 1;
    }

    let name = &line[name_start..name_end];
    if name.is_empty() {
        return Err(DecodeError::InvalidHeaderName);
    }
    if validate && name.iter().any(|&b| b <= b' ' || b >= 0x7f) {
        return Err(DecodeError::InvalidHeaderName);
    }

    let mut colon_end = name_end;
    while colon_end < line.len() {
        if line[colon_end] == b':' {
            colon_end += 1;
            break;
        }
        colon_end += 1;
    }

    let value = headers::trim(&line[colon_end.min(line.len())..]);
    Ok((name.to_vec(), value.to_vec()))
}

/// Parse a chunk-size line: hex digits up to the first `;`, whitespace, or
/// control byte.
fn parse_chunk_size(line: &[u8]) -> Result<u64, DecodeError> {
    let line = headers::trim(line);
    let mut end = 0;
    while end < line.len() {
        let b = line[end];
        if b == b';' || b <= b' ' || b == 0x7f {
            break;
        }
        end += 1;
    }

    let digits = &line[..end];
    if digits.is_empty() {
        return Err(DecodeError::InvalidChunkSize);
    }

    let mut size: u64 = 0;
    for &b in digits {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return Err(DecodeError::InvalidChunkSize),
        };
        size = size
            .checked_mul(16)
            .and_then(|s| s.checked_add(digit as u64))
            .ok_or(DecodeError::InvalidChunkSize)?;
    }
    Ok(size)
}

/// Compute Content-Length from the header block: `-1` when absent,
/// an error when unparseable or self-contradictory.
fn content_length(headers: &HeaderMap) -> Result<i64, DecodeError> {
    let mut result: Option<i64> = None;
    for value in headers.get_all(b"content-length") {
        let value = headers::trim(value);
        if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
            return Err(DecodeError::InvalidContentLength);
        }
        let mut parsed: i64 = 0;
        for &b in value {
            parsed = parsed
                .checked_mul(10)
                .and_then(|p| p.checked_add((b - b'0') as i64))
                .ok_or(DecodeError::InvalidContentLength)?;
        }
        match result {
            Some(existing) if existing != parsed => {
                return Err(DecodeError::InvalidContentLength)
            }
            _ => result = Some(parsed),
        }
    }
    Ok(result.unwrap_or(-1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::RequestFactory;

    fn decode_all(decoder: &mut RequestDecoder, bytes: &[u8]) -> Vec<Event<crate::RequestHead>> {
        let mut input = BytesMut::from(bytes);
        let mut out = Vec::new();
        decoder.decode(&mut input, &mut out);
        out
    }

    #[test]
    fn test_get_without_body() {
        let mut decoder = RequestDecoder::new(RequestFactory);
        let events = decode_all(
            &mut decoder,
            b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n",
        );

        assert_eq!(events.len(), 2);
        match &events[0] {
            Event::Head(head) => {
                assert_eq!(head.method(), b"GET");
                assert_eq!(head.uri(), b"/index.html");
                assert_eq!(head.headers().get(b"host"), Some(b"example.com" as &[u8]));
            }
            other => panic!("expected head, got {other:?}"),
        }
        match &events[1] {
            Event::LastContent { content, trailers } => {
                assert!(content.is_empty());
                assert!(trailers.is_empty());
            }
            other => panic!("expected last content, got {other:?}"),
        }
    }

    #[test]
    fn test_fixed_length_body() {
        let mut decoder = RequestDecoder::new(RequestFactory);
        let events = decode_all(
            &mut decoder,
            b"POST /submit HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello",
        );

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Event::Head(_)));
        match &events[1] {
            Event::LastContent { content, .. } => assert_eq!(&content[..], b"hello"),
            other => panic!("expected last content, got {other:?}"),
        }
    }

    #[test]
    fn test_fixed_length_body_split_across_calls() {
        let mut decoder = RequestDecoder::new(RequestFactory);
        let mut out = Vec::new();

        let mut input = BytesMut::from(&b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nhel"[..]);
        decoder.decode(&mut input, &mut out);
        assert_eq!(out.len(), 2);
        assert!(matches!(&out[0], Event::Head(_)));
        match &out[1] {
            Event::Content(content) => assert_eq!(&content[..], b"hel"),
            other => panic!("expected content, got {other:?}"),
        }

        input.extend_from_slice(b"lo world");
        decoder.decode(&mut input, &mut out);
        assert_eq!(out.len(), 3);
        match &out[2] {
            Event::LastContent { content, .. } => assert_eq!(&content[..], b"lo world"),
            other => panic!("expected last content, got {other:?}"),
        }
    }

    #[test]
    fn test_header_continuation_lines() {
        let mut decoder = RequestDecoder::new(RequestFactory);
        let events = decode_all(
            &mut decoder,
            b"GET / HTTP/1.1\r\nX-Long: first\r\n  second\r\n\tthird\r\n\r\n",
        );

        match &events[0] {
            Event::Head(head) => {
                assert_eq!(
                    head.headers().get(b"x-long"),
                    Some(b"first second third" as &[u8])
                );
            }
            other => panic!("expected head, got {other:?}"),
        }
    }

    #[test]
    fn test_leading_noise_is_skipped() {
        let mut decoder = RequestDecoder::new(RequestFactory);
        let events = decode_all(&mut decoder, b"\r\n\r\n  GET / HTTP/1.1\r\n\r\n");
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Event::Head(_)));
    }

    #[test]
    fn test_short_initial_line_is_dropped() {
        let mut decoder = RequestDecoder::new(RequestFactory);
        let events = decode_all(&mut decoder, b"GARBAGE\r\nGET / HTTP/1.1\r\n\r\n");

        // The one-field line is discarded; the real request follows.
        assert_eq!(events.len(), 2);
        match &events[0] {
            Event::Head(head) => assert_eq!(head.method(), b"GET"),
            other => panic!("expected head, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_version_is_invalid_message() {
        let mut decoder = RequestDecoder::new(RequestFactory);
        let events = decode_all(&mut decoder, b"GET / FTP/9.9\r\nHost: x\r\n\r\n");

        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::InvalidMessage(head) => {
                assert_eq!(head.failure(), Some(&DecodeError::InvalidVersion));
            }
            other => panic!("expected invalid message, got {other:?}"),
        }

        // Everything after the failure is drained without events.
        let more = decode_all(&mut decoder, b"GET / HTTP/1.1\r\n\r\n");
        assert!(more.is_empty());
    }

    #[test]
    fn test_oversize_initial_line() {
        let config = DecoderConfig::default().with_max_initial_line_length(16);
        let mut decoder = RequestDecoder::with_config(RequestFactory, config);
        let events = decode_all(&mut decoder, b"GET /a-very-long-uri-beyond-cap HTTP/1.1\r\n\r\n");

        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::InvalidMessage(head) => {
                assert_eq!(head.failure(), Some(&DecodeError::LineTooLong { limit: 16 }));
            }
            other => panic!("expected invalid message, got {other:?}"),
        }
    }

    #[test]
    fn test_oversize_header_block() {
        let config = DecoderConfig::default().with_max_header_size(32);
        let mut decoder = RequestDecoder::with_config(RequestFactory, config);
        let events = decode_all(
            &mut decoder,
            b"GET / HTTP/1.1\r\nX-Filler: aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\r\n\r\n",
        );

        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::InvalidMessage(head) => {
                assert_eq!(
                    head.failure(),
                    Some(&DecodeError::HeaderTooLong { limit: 32 })
                );
            }
            other => panic!("expected invalid message, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_chunk_size() {
        let mut decoder = RequestDecoder::new(RequestFactory);
        let events = decode_all(
            &mut decoder,
            b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n",
        );

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], Event::Head(_)));
        assert!(matches!(
            &events[1],
            Event::InvalidContent(DecodeError::InvalidChunkSize)
        ));
    }

    #[test]
    fn test_chunk_size_extensions_ignored() {
        let mut decoder = RequestDecoder::new(RequestFactory);
        let events = decode_all(
            &mut decoder,
            b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5;ext=1\r\nhello\r\n0\r\n\r\n",
        );

        assert_eq!(events.len(), 3);
        match &events[1] {
            Event::Content(content) => assert_eq!(&content[..], b"hello"),
            other => panic!("expected content, got {other:?}"),
        }
    }

    #[test]
    fn test_chunked_disabled() {
        let config = DecoderConfig::default().with_chunked_supported(false);
        let mut decoder = RequestDecoder::with_config(RequestFactory, config);
        let events = decode_all(
            &mut decoder,
            b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n",
        );

        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::InvalidMessage(head) => {
                assert_eq!(head.failure(), Some(&DecodeError::UnsupportedChunked));
            }
            other => panic!("expected invalid message, got {other:?}"),
        }
    }

    #[test]
    fn test_contradictory_content_length() {
        let mut decoder = RequestDecoder::new(RequestFactory);
        let events = decode_all(
            &mut decoder,
            b"POST / HTTP/1.1\r\nContent-Length: 5\r\nContent-Length: 6\r\n\r\n",
        );

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::InvalidMessage(_)));
    }

    #[test]
    fn test_pipelined_requests_in_one_buffer() {
        let mut decoder = RequestDecoder::new(RequestFactory);
        let events = decode_all(
            &mut decoder,
            b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n",
        );

        assert_eq!(events.len(), 4);
        match (&events[0], &events[2]) {
            (Event::Head(a), Event::Head(b)) => {
                assert_eq!(a.uri(), b"/a");
                assert_eq!(b.uri(), b"/b");
            }
            other => panic!("expected two heads, got {other:?}"),
        }
    }

    #[test]
    fn test_expectation_failed_resets_body_read() {
        let mut decoder = RequestDecoder::new(RequestFactory);
        let mut input =
            BytesMut::from(&b"POST / HTTP/1.1\r\nContent-Length: 100\r\n\r\nabc"[..]);
        let mut out = Vec::new();
        decoder.decode(&mut input, &mut out);
        assert!(matches!(out.last(), Some(Event::Content(_))));

        decoder.expectation_failed();

        // The deferred reset applies at the next entry: the stale body
        // bytes are treated as a new message boundary.
        let mut out2 = Vec::new();
        let mut next = BytesMut::from(&b"GET /next HTTP/1.1\r\n\r\n"[..]);
        decoder.decode(&mut next, &mut out2);
        assert_eq!(out2.len(), 2);
        match &out2[0] {
            Event::Head(head) => assert_eq!(head.uri(), b"/next"),
            other => panic!("expected head, got {other:?}"),
        }
    }

    #[test]
    fn test_upgraded_passthrough() {
        let mut decoder = RequestDecoder::new(RequestFactory);
        decoder.upgraded();

        let mut input = BytesMut::from(&b"\x00\x01binary frames"[..]);
        let mut out = Vec::new();
        decoder.decode(&mut input, &mut out);

        assert_eq!(out.len(), 1);
        match &out[0] {
            Event::Upgraded(data) => assert_eq!(&data[..], b"\x00\x01binary frames"),
            other => panic!("expected upgraded bytes, got {other:?}"),
        }
        assert!(input.is_empty());
    }

    #[test]
    fn test_max_chunk_size_splits_content() {
        let config = DecoderConfig::default().with_max_chunk_size(4);
        let mut decoder = RequestDecoder::with_config(RequestFactory, config);
        let events = decode_all(
            &mut decoder,
            b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\n0123456789",
        );

        // 4 + 4 + 2, the last marked terminal.
        assert_eq!(events.len(), 4);
        match (&events[1], &events[2], &events[3]) {
            (
                Event::Content(a),
                Event::Content(b),
                Event::LastContent { content, .. },
            ) => {
                assert_eq!(&a[..], b"0123");
                assert_eq!(&b[..], b"4567");
                assert_eq!(&content[..], b"89");
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_split_initial_line_fields() {
        assert_eq!(
            split_initial_line(b"GET /path HTTP/1.1"),
            Some((b"GET" as &[u8], b"/path" as &[u8], b"HTTP/1.1" as &[u8]))
        );
        // The third field keeps internal spaces.
        assert_eq!(
            split_initial_line(b"HTTP/1.1 404 Not Found"),
            Some((b"HTTP/1.1" as &[u8], b"404" as &[u8], b"Not Found" as &[u8]))
        );
        assert_eq!(split_initial_line(b"GET /path"), None);
        assert_eq!(split_initial_line(b"ONEFIELD"), None);
        assert_eq!(split_initial_line(b""), None);
    }

    #[test]
    fn test_split_header_shapes() {
        assert_eq!(
            split_header(b"Host: example.com", true).unwrap(),
            (b"Host".to_vec(), b"example.com".to_vec())
        );
        assert_eq!(
            split_header(b"Empty:", true).unwrap(),
            (b"Empty".to_vec(), b"".to_vec())
        );
        assert_eq!(
            split_header(b"Spaced  :   padded value  ", true).unwrap(),
            (b"Spaced".to_vec(), b"padded value".to_vec())
        );
        assert!(split_header(b": no name", true).is_err());
        assert!(split_header(b"Bad\x01Name: x", true).is_err());
        assert!(split_header(b"Bad\x01Name: x", false).is_ok());
    }

    #[test]
    fn test_parse_chunk_size_forms() {
        assert_eq!(parse_chunk_size(b"0"), Ok(0));
        assert_eq!(parse_chunk_size(b"a"), Ok(10));
        assert_eq!(parse_chunk_size(b"1F"), Ok(31));
        assert_eq!(parse_chunk_size(b"5;name=value"), Ok(5));
        assert_eq!(parse_chunk_size(b"  10  "), Ok(16));
        assert!(parse_chunk_size(b"").is_err());
        assert!(parse_chunk_size(b";ext").is_err());
        assert!(parse_chunk_size(b"xyz").is_err());
        assert!(parse_chunk_size(b"fffffffffffffffff").is_err());
    }
}
