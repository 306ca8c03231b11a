//! Prefix integer encoding (RFC 7541 Section 5.1).

use bytes::{BufMut, BytesMut};

/// Encode an integer with an N-bit prefix (RFC 7541 Section 5.1).
///
/// `mask` supplies the bits of the first byte outside the prefix; `prefix_bits`
/// must be in `1..=8`. Values that do not fit the prefix continue in 7-bit
/// groups, least significant first, with the high bit marking continuation.
pub(crate) fn encode_integer(buf: &mut BytesMut, mask: u8, prefix_bits: u8, value: u64) {
    debug_assert!((1..=8).contains(&prefix_bits));

    let max_prefix: u64 = (1 << prefix_bits) - 1;

    if value < max_prefix {
        buf.put_u8(mask | value as u8);
    } else {
        buf.put_u8(mask | max_prefix as u8);
        let mut remainder = value - max_prefix;
        while remainder >= 0x80 {
            buf.put_u8((remainder & 0x7f) as u8 | 0x80);
            remainder >>= 7;
        }
        buf.put_u8(remainder as u8);
    }
}
