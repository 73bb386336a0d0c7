//! ../../../src/auxiliary.rs の SegmentMetadataTracker の C API を定義するためのモジュール
use std::ffi::{CStr, CString, c_char, c_void};

use shiguredo_emsg_id3::{
    ExtractorOptions, MetadataRecord,
    aux::{SegmentMetadataTracker, SegmentTrackerOptions},
};

use crate::error::EmsgId3Error;

/// メタデータが見つかるたびに呼び出されるコールバック関数
///
/// 文字列引数はいずれも NULL の可能性があり、コールバックの呼び出し中のみ有効
pub type EmsgId3MetadataCallback = Option<
    unsafe extern "C" fn(
        user_data: *mut c_void,
        title: *const c_char,
        artist: *const c_char,
        album: *const c_char,
        year: *const c_char,
        artwork_url: *const c_char,
        radio_station: *const c_char,
        station_owner: *const c_char,
    ),
>;

pub struct EmsgId3Tracker {
    inner: SegmentMetadataTracker,
    last_error_string: Option<CString>,
}

impl EmsgId3Tracker {
    fn set_last_error(&mut self, message: &str) {
        self.last_error_string = CString::new(message).ok();
    }
}

unsafe fn optional_string(s: *const c_char) -> Option<String> {
    if s.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned())
}

fn to_c_string(s: &Option<String>) -> Option<CString> {
    s.as_deref().and_then(|s| CString::new(s).ok())
}

fn as_ptr(s: &Option<CString>) -> *const c_char {
    s.as_ref().map_or(core::ptr::null(), |s| s.as_ptr())
}

unsafe fn notify(
    callback: EmsgId3MetadataCallback,
    user_data: *mut c_void,
    record: &MetadataRecord,
) {
    let Some(callback) = callback else {
        return;
    };

    // 文字列の寿命をコールバックの呼び出しが終わるまで保つために、先に全て変換しておく
    let title = to_c_string(&record.title);
    let artist = to_c_string(&record.artist);
    let album = to_c_string(&record.album);
    let year = to_c_string(&record.year);
    let artwork_url = to_c_string(&record.artwork_url);
    let radio_station = to_c_string(&record.radio_station);
    let station_owner = to_c_string(&record.station_owner);

    unsafe {
        callback(
            user_data,
            as_ptr(&title),
            as_ptr(&artist),
            as_ptr(&album),
            as_ptr(&year),
            as_ptr(&artwork_url),
            as_ptr(&radio_station),
            as_ptr(&station_owner),
        );
    }
}

/// メタデータ抽出用のトラッカーを生成する
///
/// `radio_station` と `station_owner` は、見つかった全てのメタデータにそのまま設定される（NULL 可）
#[unsafe(no_mangle)]
pub unsafe extern "C" fn emsg_id3_tracker_new(
    radio_station: *const c_char,
    station_owner: *const c_char,
) -> *mut EmsgId3Tracker {
    let extractor = ExtractorOptions {
        radio_station: unsafe { optional_string(radio_station) },
        station_owner: unsafe { optional_string(station_owner) },
    };
    let tracker = EmsgId3Tracker {
        inner: SegmentMetadataTracker::new(SegmentTrackerOptions {
            extractor,
            ..Default::default()
        }),
        last_error_string: None,
    };
    Box::into_raw(Box::new(tracker))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn emsg_id3_tracker_free(tracker: *mut EmsgId3Tracker) {
    if !tracker.is_null() {
        let _ = unsafe { Box::from_raw(tracker) };
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn emsg_id3_tracker_get_last_error(
    tracker: *const EmsgId3Tracker,
) -> *const c_char {
    if tracker.is_null() {
        return c"Invalid tracker: null pointer".as_ptr();
    }

    let tracker = unsafe { &*tracker };
    let Some(e) = &tracker.last_error_string else {
        return core::ptr::null();
    };
    e.as_ptr()
}

/// 新しいセグメントの受信を開始する
#[unsafe(no_mangle)]
pub unsafe extern "C" fn emsg_id3_tracker_start_segment(
    tracker: *mut EmsgId3Tracker,
) -> EmsgId3Error {
    if tracker.is_null() {
        return EmsgId3Error::NullPointer;
    }
    let tracker = unsafe { &mut *tracker };
    tracker.inner.start_segment();
    EmsgId3Error::Ok
}

/// 現在のセグメントの続きのバイト列を入力する
///
/// このセグメントで新しく見つかったメタデータごとに `callback` が呼び出される
#[unsafe(no_mangle)]
pub unsafe extern "C" fn emsg_id3_tracker_handle_input(
    tracker: *mut EmsgId3Tracker,
    input_data: *const u8,
    input_data_size: usize,
    callback: EmsgId3MetadataCallback,
    user_data: *mut c_void,
) -> EmsgId3Error {
    if tracker.is_null() {
        return EmsgId3Error::NullPointer;
    }
    let tracker = unsafe { &mut *tracker };

    if callback.is_none() {
        tracker.set_last_error("[emsg_id3_tracker_handle_input] callback is null");
        return EmsgId3Error::NullPointer;
    }
    if input_data_size == 0 {
        return EmsgId3Error::Ok;
    }
    if input_data.is_null() {
        tracker.set_last_error("[emsg_id3_tracker_handle_input] input_data is null");
        return EmsgId3Error::NullPointer;
    }
    if input_data_size > isize::MAX as usize {
        tracker.set_last_error("[emsg_id3_tracker_handle_input] input_data_size is too large");
        return EmsgId3Error::InvalidInput;
    }

    let input_data = unsafe { std::slice::from_raw_parts(input_data, input_data_size) };
    let records = tracker.inner.handle_input(input_data);
    log::debug!(
        "Segment #{}: notifying {} record(s)",
        tracker.inner.segment_sequence(),
        records.len()
    );
    for record in &records {
        unsafe { notify(callback, user_data, record) };
    }

    EmsgId3Error::Ok
}
