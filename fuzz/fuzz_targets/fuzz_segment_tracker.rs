#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_emsg_id3::aux::SegmentMetadataTracker;

fuzz_target!(|data: &[u8]| {
    // 先頭バイトを分割サイズとして使い、残りを少しずつ入力する
    let Some((&chunk_size, rest)) = data.split_first() else {
        return;
    };
    let mut tracker = SegmentMetadataTracker::default();
    for chunk in rest.chunks(usize::from(chunk_size).max(1)) {
        let _ = tracker.handle_input(chunk);
    }
    assert_eq!(tracker.buffered_len(), rest.len());
});
