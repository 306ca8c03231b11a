//! HPACK header block encoding.

use bytes::{BufMut, BytesMut};

use crate::huffman;
use crate::integer::encode_integer;
use crate::table::{DynamicTable, HeaderField, StaticTable};

/// Default dynamic table size (RFC 7540 `SETTINGS_HEADER_TABLE_SIZE`).
pub const DEFAULT_HEADER_TABLE_SIZE: u32 = 4096;

/// Largest dynamic table size that may be configured.
pub const MAX_HEADER_TABLE_SIZE: u32 = i32::MAX as u32;

/// Largest header list size that may be configured. The default leaves the
/// list size effectively unlimited, per RFC 7540 `SETTINGS_MAX_HEADER_LIST_SIZE`.
pub const MAX_HEADER_LIST_SIZE: u64 = u32::MAX as u64;

/// HPACK encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// Configured dynamic table size is out of range.
    #[error("invalid max header table size: {0}")]
    InvalidTableSize(u32),
    /// Configured header list size is out of range.
    #[error("invalid max header list size: {0}")]
    InvalidListSize(u64),
    /// The header list exceeds the negotiated size limit. This is a
    /// connection-level protocol error; nothing has been written and the
    /// dynamic table is unchanged.
    #[error("header list size {size} exceeds limit {max} on stream {stream_id}")]
    HeaderListTooLarge {
        stream_id: u32,
        size: u64,
        max: u64,
    },
}

/// Encoder configuration.
#[derive(Debug, Clone)]
pub struct EncoderOptions {
    max_header_table_size: u32,
    max_header_list_size: u64,
    ignore_max_header_list_size: bool,
    table_size_hint: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            max_header_table_size: DEFAULT_HEADER_TABLE_SIZE,
            max_header_list_size: MAX_HEADER_LIST_SIZE,
            ignore_max_header_list_size: false,
            table_size_hint: 16,
        }
    }
}

impl EncoderOptions {
    /// Set the initial dynamic table size bound.
    pub fn with_max_header_table_size(mut self, size: u32) -> Self {
        self.max_header_table_size = size;
        self
    }

    /// Set the header list size bound enforced before encoding.
    pub fn with_max_header_list_size(mut self, size: u64) -> Self {
        self.max_header_list_size = size;
        self
    }

    /// Skip header list size enforcement entirely.
    pub fn with_ignore_max_header_list_size(mut self, ignore: bool) -> Self {
        self.ignore_max_header_list_size = ignore;
        self
    }

    /// Hint for the dynamic table's bucket count; rounded to a power of two
    /// in `[2, 128]`.
    pub fn with_table_size_hint(mut self, hint: usize) -> Self {
        self.table_size_hint = hint;
        self
    }
}

/// Literal representation kinds (RFC 7541 Section 6.2).
#[derive(Debug, Clone, Copy)]
enum IndexKind {
    /// Literal with incremental indexing: `01xxxxxx`.
    Incremental,
    /// Literal without indexing: `0000xxxx`.
    None,
    /// Literal never indexed: `0001xxxx`.
    Never,
}

impl IndexKind {
    fn mask_and_prefix(self) -> (u8, u8) {
        match self {
            IndexKind::Incremental => (0x40, 6),
            IndexKind::None => (0x00, 4),
            IndexKind::Never => (0x10, 4),
        }
    }
}

/// HPACK encoder.
///
/// One encoder serves one HTTP/2 connection's outbound header blocks; it is
/// not safe to share between threads. Each call to [`encode_header_block`]
/// produces one complete block and updates the dynamic table in step with
/// what the peer's decoder will reconstruct.
///
/// [`encode_header_block`]: HpackEncoder::encode_header_block
pub struct HpackEncoder {
    table: DynamicTable,
    max_header_list_size: u64,
    ignore_max_header_list_size: bool,
}

impl Default for HpackEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HpackEncoder {
    /// Create an encoder with default settings.
    pub fn new() -> Self {
        Self {
            table: DynamicTable::new(DEFAULT_HEADER_TABLE_SIZE, 16),
            max_header_list_size: MAX_HEADER_LIST_SIZE,
            ignore_max_header_list_size: false,
        }
    }

    /// Create an encoder from explicit options.
    pub fn with_options(options: EncoderOptions) -> Result<Self, EncodeError> {
        if options.max_header_table_size > MAX_HEADER_TABLE_SIZE {
            return Err(EncodeError::InvalidTableSize(options.max_header_table_size));
        }
        if options.max_header_list_size > MAX_HEADER_LIST_SIZE {
            return Err(EncodeError::InvalidListSize(options.max_header_list_size));
        }
        Ok(Self {
            table: DynamicTable::new(options.max_header_table_size, options.table_size_hint),
            max_header_list_size: options.max_header_list_size,
            ignore_max_header_list_size: options.ignore_max_header_list_size,
        })
    }

    /// Number of entries in the dynamic table.
    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    /// Sum of dynamic table entry sizes.
    pub fn table_size(&self) -> u64 {
        self.table.size()
    }

    /// Current dynamic table size bound.
    pub fn max_header_table_size(&self) -> u32 {
        self.table.max_size()
    }

    /// Current header list size bound.
    pub fn max_header_list_size(&self) -> u64 {
        self.max_header_list_size
    }

    /// Encode one header block into `buf`, in input order.
    ///
    /// `sensitive` classifies a header as never-indexed; such headers are
    /// transmitted literally and leave the dynamic table untouched. Unless
    /// list-size enforcement is disabled, the total header list size is
    /// checked up front: on excess nothing is written, the table is not
    /// mutated, and the error carries `stream_id` for connection teardown.
    pub fn encode_header_block<F>(
        &mut self,
        stream_id: u32,
        buf: &mut BytesMut,
        headers: &[HeaderField],
        mut sensitive: F,
    ) -> Result<(), EncodeError>
    where
        F: FnMut(&[u8], &[u8]) -> bool,
    {
        if !self.ignore_max_header_list_size {
            let list_size: u64 = headers.iter().map(|h| h.size()).sum();
            if list_size > self.max_header_list_size {
                return Err(EncodeError::HeaderListTooLarge {
                    stream_id,
                    size: list_size,
                    max: self.max_header_list_size,
                });
            }
        }

        for header in headers {
            let is_sensitive = sensitive(&header.name, &header.value);
            self.encode_header(buf, &header.name, &header.value, is_sensitive, header.size());
        }
        Ok(())
    }

    /// Change the dynamic table size bound, shrinking the table if needed
    /// and emitting a dynamic-table-size-update directive. A no-op when the
    /// size is unchanged.
    pub fn set_max_header_table_size(
        &mut self,
        buf: &mut BytesMut,
        new_max: u32,
    ) -> Result<(), EncodeError> {
        if new_max > MAX_HEADER_TABLE_SIZE {
            return Err(EncodeError::InvalidTableSize(new_max));
        }
        if new_max == self.table.max_size() {
            return Ok(());
        }
        self.table.set_max_size(new_max);
        encode_integer(buf, 0x20, 5, new_max as u64);
        Ok(())
    }

    /// Change the header list size bound. No wire effect.
    pub fn set_max_header_list_size(&mut self, new_max: u64) -> Result<(), EncodeError> {
        if new_max > MAX_HEADER_LIST_SIZE {
            return Err(EncodeError::InvalidListSize(new_max));
        }
        self.max_header_list_size = new_max;
        Ok(())
    }

    fn encode_header(
        &mut self,
        buf: &mut BytesMut,
        name: &[u8],
        value: &[u8],
        sensitive: bool,
        header_size: u64,
    ) {
        if sensitive {
            let name_index = self.name_index(name);
            self.encode_literal(buf, IndexKind::Never, name_index, name, value);
            return;
        }

        if self.table.max_size() == 0 {
            // The dynamic table is disabled; only static references apply.
            match StaticTable::find(name, value) {
                Some((index, true)) => encode_indexed(buf, index),
                Some((index, false)) => {
                    self.encode_literal(buf, IndexKind::None, Some(index), name, value)
                }
                None => self.encode_literal(buf, IndexKind::None, None, name, value),
            }
            return;
        }

        if header_size > self.table.max_size() as u64 {
            // Would evict the whole table without ever being referenced.
            let name_index = self.name_index(name);
            self.encode_literal(buf, IndexKind::None, name_index, name, value);
            return;
        }

        if let Some(index) = self.table.find_exact(name, value) {
            encode_indexed(buf, StaticTable::len() + index);
        } else if let Some((index, true)) = StaticTable::find(name, value) {
            encode_indexed(buf, index);
        } else {
            let name_index = self.name_index(name);
            self.encode_literal(buf, IndexKind::Incremental, name_index, name, value);
            self.table.add(name.to_vec(), value.to_vec(), header_size);
        }
    }

    /// Lowest index usable for a name reference: static table first, then
    /// dynamic offset past it.
    fn name_index(&self, name: &[u8]) -> Option<u64> {
        StaticTable::find_name(name)
            .or_else(|| self.table.find_name(name).map(|i| StaticTable::len() + i))
    }

    fn encode_literal(
        &self,
        buf: &mut BytesMut,
        kind: IndexKind,
        name_index: Option<u64>,
        name: &[u8],
        value: &[u8],
    ) {
        let (mask, prefix) = kind.mask_and_prefix();
        encode_integer(buf, mask, prefix, name_index.unwrap_or(0));
        if name_index.is_none() {
            encode_string(buf, name);
        }
        encode_string(buf, value);
    }
}

/// Indexed header field: `1xxxxxxx` (RFC 7541 Section 6.1).
fn encode_indexed(buf: &mut BytesMut, index: u64) {
    encode_integer(buf, 0x80, 7, index);
}

/// String literal: Huffman when strictly shorter, raw otherwise
/// (RFC 7541 Section 5.2).
fn encode_string(buf: &mut BytesMut, data: &[u8]) {
    let huffman_len = huffman::encoded_len(data);
    if huffman_len < data.len() {
        encode_integer(buf, 0x80, 7, huffman_len as u64);
        huffman::encode(data, buf);
    } else {
        encode_integer(buf, 0x00, 7, data.len() as u64);
        buf.put_slice(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Vec<HeaderField> {
        pairs
            .iter()
            .map(|(n, v)| HeaderField::new(n.as_bytes().to_vec(), v.as_bytes().to_vec()))
            .collect()
    }

    fn not_sensitive(_: &[u8], _: &[u8]) -> bool {
        false
    }

    #[test]
    fn test_static_table_hit() {
        let mut encoder = HpackEncoder::new();
        let mut buf = BytesMut::new();

        encoder
            .encode_header_block(1, &mut buf, &headers(&[(":method", "GET")]), not_sensitive)
            .unwrap();

        assert_eq!(&buf[..], &[0x82]);
        assert_eq!(encoder.table_len(), 0);
    }

    #[test]
    fn test_literal_with_incremental_indexing() {
        let mut encoder = HpackEncoder::new();
        let mut buf = BytesMut::new();

        encoder
            .encode_header_block(
                1,
                &mut buf,
                &headers(&[("custom-key", "custom-header")]),
                not_sensitive,
            )
            .unwrap();

        // 0x40: incremental indexing, no name index; both strings are
        // shorter Huffman-coded.
        let expected: &[u8] = &[
            0x40, 0x88, 0x25, 0xa8, 0x49, 0xe9, 0x5b, 0xa9, 0x7d, 0x7f, 0x89, 0x25, 0xa8, 0x49,
            0xe9, 0x5a, 0x72, 0x8e, 0x42, 0xd9,
        ];
        assert_eq!(&buf[..], expected);
        assert_eq!(encoder.table_len(), 1);
        assert_eq!(encoder.table_size(), 10 + 13 + 32);
    }

    #[test]
    fn test_second_occurrence_uses_dynamic_index() {
        let mut encoder = HpackEncoder::new();
        let mut buf = BytesMut::new();
        let hs = headers(&[("custom-key", "custom-header")]);

        encoder
            .encode_header_block(1, &mut buf, &hs, not_sensitive)
            .unwrap();
        buf.clear();
        encoder
            .encode_header_block(1, &mut buf, &hs, not_sensitive)
            .unwrap();

        // Dynamic index 1 sits just past the 61 static entries.
        assert_eq!(&buf[..], &[0x80 | 62]);
        assert_eq!(encoder.table_len(), 1);
    }

    #[test]
    fn test_sensitive_header_never_indexed() {
        let mut encoder = HpackEncoder::new();
        let mut buf = BytesMut::new();

        encoder
            .encode_header_block(1, &mut buf, &headers(&[("password", "q1w2e3")]), |_, _| true)
            .unwrap();

        assert_eq!(buf[0] & 0xf0, 0x10);
        assert_eq!(encoder.table_len(), 0);

        // Name is not in either table, so it is sent literally.
        let expected: &[u8] = &[
            0x10, 0x86, 0xac, 0x68, 0x47, 0x83, 0xd9, 0x27, 0x85, 0xec, 0x1f, 0x02, 0x2b, 0x3f,
        ];
        assert_eq!(&buf[..], expected);
    }

    #[test]
    fn test_sensitive_header_keeps_name_index() {
        let mut encoder = HpackEncoder::new();
        let mut buf = BytesMut::new();

        encoder
            .encode_header_block(
                1,
                &mut buf,
                &headers(&[("authorization", "secret")]),
                |_, _| true,
            )
            .unwrap();

        // 0001xxxx with the static name index for authorization (23).
        assert_eq!(buf[0], 0x10 | 23);
        assert_eq!(encoder.table_len(), 0);
    }

    #[test]
    fn test_table_size_zero_static_only() {
        let mut encoder =
            HpackEncoder::with_options(EncoderOptions::default().with_max_header_table_size(0))
                .unwrap();
        let mut buf = BytesMut::new();

        encoder
            .encode_header_block(
                1,
                &mut buf,
                &headers(&[(":method", "GET"), ("custom-key", "v")]),
                not_sensitive,
            )
            .unwrap();

        // Exact static match stays indexed; everything else is a plain
        // literal and the table stays empty.
        assert_eq!(buf[0], 0x82);
        assert_eq!(buf[1] & 0xf0, 0x00);
        assert_eq!(encoder.table_len(), 0);
    }

    #[test]
    fn test_oversized_header_not_indexed() {
        let mut encoder =
            HpackEncoder::with_options(EncoderOptions::default().with_max_header_table_size(40))
                .unwrap();
        let mut buf = BytesMut::new();
        let big_value = "v".repeat(64);

        encoder
            .encode_header_block(
                1,
                &mut buf,
                &headers(&[("user-agent", &big_value)]),
                not_sensitive,
            )
            .unwrap();

        // Literal without indexing, name-indexed via the static table (58).
        assert_eq!(buf[0], 0x0f);
        assert_eq!(encoder.table_len(), 0);
    }

    #[test]
    fn test_table_size_update_directive() {
        let mut encoder = HpackEncoder::new();
        let mut buf = BytesMut::new();

        // Three entries of 34 bytes each.
        encoder
            .encode_header_block(
                1,
                &mut buf,
                &headers(&[("a", "1"), ("b", "2"), ("c", "3")]),
                not_sensitive,
            )
            .unwrap();
        assert_eq!(encoder.table_size(), 102);

        buf.clear();
        encoder.set_max_header_table_size(&mut buf, 70).unwrap();

        // Size update with 5-bit prefix: 0x20 | 31, then 70 - 31 = 39.
        assert_eq!(&buf[..], &[0x3f, 39]);
        assert_eq!(encoder.max_header_table_size(), 70);
        assert!(encoder.table_size() <= 70);
        assert_eq!(encoder.table_len(), 2);
    }

    #[test]
    fn test_table_size_update_unchanged_is_silent() {
        let mut encoder = HpackEncoder::new();
        let mut buf = BytesMut::new();

        encoder
            .set_max_header_table_size(&mut buf, DEFAULT_HEADER_TABLE_SIZE)
            .unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_table_size_out_of_range() {
        let mut encoder = HpackEncoder::new();
        let mut buf = BytesMut::new();

        let err = encoder
            .set_max_header_table_size(&mut buf, MAX_HEADER_TABLE_SIZE + 1)
            .unwrap_err();
        assert!(matches!(err, EncodeError::InvalidTableSize(_)));
        assert!(buf.is_empty());
        assert_eq!(encoder.max_header_table_size(), DEFAULT_HEADER_TABLE_SIZE);
    }

    #[test]
    fn test_header_list_size_preflight() {
        let mut encoder = HpackEncoder::new();
        encoder.set_max_header_list_size(100).unwrap();
        let mut buf = BytesMut::new();

        // 34 + 34 = 68 fits; adding a 64-byte header does not.
        let too_big = headers(&[("a", "1"), ("b", "2"), ("long-name", "long-value-xxxxxxxxxxx")]);
        let err = encoder
            .encode_header_block(3, &mut buf, &too_big, not_sensitive)
            .unwrap_err();

        match err {
            EncodeError::HeaderListTooLarge { stream_id, max, .. } => {
                assert_eq!(stream_id, 3);
                assert_eq!(max, 100);
            }
            other => panic!("unexpected error: {other}"),
        }
        // No partial output, no table mutation.
        assert!(buf.is_empty());
        assert_eq!(encoder.table_len(), 0);
        assert_eq!(encoder.table_size(), 0);
    }

    #[test]
    fn test_ignore_header_list_size() {
        let mut encoder = HpackEncoder::with_options(
            EncoderOptions::default()
                .with_ignore_max_header_list_size(true)
                .with_max_header_list_size(1),
        )
        .unwrap();
        let mut buf = BytesMut::new();

        encoder
            .encode_header_block(1, &mut buf, &headers(&[("custom-key", "v")]), not_sensitive)
            .unwrap();
        assert!(!buf.is_empty());
        assert_eq!(encoder.table_len(), 1);
    }

    #[test]
    fn test_raw_string_when_huffman_longer() {
        let mut encoder = HpackEncoder::new();
        let mut buf = BytesMut::new();

        // Control bytes have 24-30 bit codes, so raw encoding wins.
        let value = HeaderField::new(b"x".to_vec(), b"\x01\x02\x03".to_vec());
        encoder
            .encode_header_block(1, &mut buf, &[value], not_sensitive)
            .unwrap();

        // name literal: huffman flag set for "x"? "x" is 7 bits -> 1 byte,
        // not shorter than raw 1 byte, so raw; value likewise raw.
        assert_eq!(buf[0], 0x40);
        assert_eq!(buf[1], 0x01);
        assert_eq!(buf[2], b'x');
        assert_eq!(buf[3], 0x03);
        assert_eq!(&buf[4..7], b"\x01\x02\x03");
    }
}
