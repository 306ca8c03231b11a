#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use protocol_hpack::{EncoderOptions, HeaderField, HpackEncoder};

fuzz_target!(|data: &[u8]| {
    // Interpret the input as a stream of length-prefixed name/value pairs
    // plus a table size to exercise eviction.
    let mut data = data;
    let table_size = match data.first() {
        Some(&b) => (b as u32) * 64,
        None => return,
    };
    data = &data[1..];

    let mut headers = Vec::new();
    while data.len() >= 2 {
        let name_len = (data[0] as usize % 32) + 1;
        let value_len = data[1] as usize % 64;
        data = &data[2..];
        if data.len() < name_len + value_len {
            break;
        }
        let (name, rest) = data.split_at(name_len);
        let (value, rest) = rest.split_at(value_len);
        data = rest;
        headers.push(HeaderField::new(name.to_vec(), value.to_vec()));
    }

    let mut encoder = HpackEncoder::with_options(
        EncoderOptions::default()
            .with_max_header_table_size(table_size)
            .with_ignore_max_header_list_size(true),
    )
    .unwrap();

    let mut buf = BytesMut::new();
    // Every third header is marked sensitive to cover the never-indexed path.
    let mut counter = 0u32;
    encoder
        .encode_header_block(1, &mut buf, &headers, |_, _| {
            counter += 1;
            counter % 3 == 0
        })
        .unwrap();

    // The table bound must hold after any sequence of insertions.
    assert!(encoder.table_size() <= table_size as u64);

    // An encoded block for a non-empty list is never empty.
    if !headers.is_empty() {
        assert!(!buf.is_empty());
    }
});
