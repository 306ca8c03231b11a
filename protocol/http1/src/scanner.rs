//! CR/LF line extraction with length caps.

use bytes::{Buf, BytesMut};

use crate::error::DecodeError;

/// What a scanner is extracting; selects the overflow error.
#[derive(Debug, Clone, Copy)]
enum Context {
    Line,
    Header,
}

/// Cap-enforced line scanner over a reusable scratch buffer.
///
/// `parse` consumes input up to and including the next LF, discarding CRs,
/// and exposes the line through [`Scanner::content`]. When no LF is present
/// the read cursor is left untouched and `Ok(None)` is returned; the next
/// call rescans from the line start, so the running size is rolled back to
/// what it was before the attempt.
struct Scanner {
    scratch: Vec<u8>,
    max_length: usize,
    size: usize,
    context: Context,
}

impl Scanner {
    fn new(max_length: usize, initial_capacity: usize, context: Context) -> Self {
        Self {
            scratch: Vec::with_capacity(initial_capacity),
            max_length,
            size: 0,
            context,
        }
    }

    fn overflow(&self) -> DecodeError {
        match self.context {
            Context::Line => DecodeError::LineTooLong {
                limit: self.max_length,
            },
            Context::Header => DecodeError::HeaderTooLong {
                limit: self.max_length,
            },
        }
    }

    fn parse(&mut self, input: &mut BytesMut) -> Result<Option<()>, DecodeError> {
        let old_size = self.size;
        self.scratch.clear();
        let mut size = old_size;

        for (i, &b) in input.iter().enumerate() {
            match b {
                b'\r' => {}
                b'\n' => {
                    input.advance(i + 1);
                    self.size = size;
                    return Ok(Some(()));
                }
                _ => {
                    size += 1;
                    if size > self.max_length {
                        return Err(self.overflow());
                    }
                    self.scratch.push(b);
                }
            }
        }

        // No LF yet; leave the cursor alone and roll the count back so the
        // rescan does not double-charge these bytes.
        self.size = old_size;
        Ok(None)
    }

    fn content(&self) -> &[u8] {
        &self.scratch
    }

    fn reset(&mut self) {
        self.size = 0;
    }
}

/// Scanner for initial lines, chunk-size lines, and chunk delimiters. The
/// cap applies per line.
pub(crate) struct LineScanner {
    inner: Scanner,
}

impl LineScanner {
    pub(crate) fn new(max_length: usize, initial_capacity: usize) -> Self {
        Self {
            inner: Scanner::new(max_length, initial_capacity, Context::Line),
        }
    }

    pub(crate) fn parse(&mut self, input: &mut BytesMut) -> Result<Option<()>, DecodeError> {
        self.inner.reset();
        self.inner.parse(input)
    }

    pub(crate) fn content(&self) -> &[u8] {
        self.inner.content()
    }

    pub(crate) fn reset(&mut self) {
        self.inner.reset();
    }
}

/// Scanner for header and trailer lines. The cap applies to the whole
/// block: the running size accumulates across lines and is reset only at
/// message boundaries.
pub(crate) struct HeaderScanner {
    inner: Scanner,
}

impl HeaderScanner {
    pub(crate) fn new(max_length: usize, initial_capacity: usize) -> Self {
        Self {
            inner: Scanner::new(max_length, initial_capacity, Context::Header),
        }
    }

    pub(crate) fn parse(&mut self, input: &mut BytesMut) -> Result<Option<()>, DecodeError> {
        self.inner.parse(input)
    }

    pub(crate) fn content(&self) -> &[u8] {
        self.inner.content()
    }

    pub(crate) fn reset(&mut self) {
        self.inner.reset();
    }
}
