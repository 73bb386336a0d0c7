#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_emsg_id3::{ByteSpan, Id3Payload};

fuzz_target!(|data: &[u8]| {
    let payload = Id3Payload {
        span: ByteSpan::new(0, data.len()),
    };
    for frame in payload.frames(data) {
        assert!(payload.span.contains(frame.data));
    }
    let _ = payload.decode_fields(data);
});
