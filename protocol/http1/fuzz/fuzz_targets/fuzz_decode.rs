#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use protocol_http1::{Event, RequestDecoder, RequestFactory};

fuzz_target!(|data: &[u8]| {
    // Whole-buffer decode must never panic, whatever the bytes.
    let mut decoder = RequestDecoder::new(RequestFactory);
    let mut input = BytesMut::from(data);
    let mut events = Vec::new();
    decoder.decode(&mut input, &mut events);
    decoder.decode_last(&mut input, &mut events);

    // Split decode at every boundary must consume monotonically and never
    // emit more heads than the whole-buffer pass.
    let whole_heads = events
        .iter()
        .filter(|e| matches!(e, Event::Head(_)))
        .count();

    if data.len() < 64 {
        for split_at in 0..=data.len() {
            let mut decoder = RequestDecoder::new(RequestFactory);
            let mut events = Vec::new();

            let mut buf = BytesMut::from(&data[..split_at]);
            decoder.decode(&mut buf, &mut events);
            buf.extend_from_slice(&data[split_at..]);
            decoder.decode(&mut buf, &mut events);
            decoder.decode_last(&mut buf, &mut events);

            let split_heads = events
                .iter()
                .filter(|e| matches!(e, Event::Head(_)))
                .count();
            assert_eq!(split_heads, whole_heads, "split at {split_at}");
        }
    }
});
