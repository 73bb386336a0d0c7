#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_emsg_id3::text::{clean_text, extract_artwork_url, extract_year};

fuzz_target!(|data: &[u8]| {
    if let Some(s) = clean_text(data) {
        assert!(!s.is_empty());
        let _ = extract_year(&s);
    }
    if let Some(url) = extract_artwork_url(data) {
        assert!(url.starts_with("http://") || url.starts_with("https://"));
    }
});
