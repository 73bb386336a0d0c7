#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_emsg_id3::MetadataExtractor;

fuzz_target!(|data: &[u8]| {
    for record in MetadataExtractor::new().records(data) {
        assert!(record.title.is_some() || record.artist.is_some() || record.album.is_some());
    }
});
