#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_emsg_id3::scan_emsg_boxes;

fuzz_target!(|data: &[u8]| {
    for emsg_box in scan_emsg_boxes(data) {
        assert!(emsg_box.span.fits_in(data.len()));
        for payload in emsg_box.id3_payload_candidates(data) {
            assert!(emsg_box.span.contains(payload.span));
        }
    }
});
