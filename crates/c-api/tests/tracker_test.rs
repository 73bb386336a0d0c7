use std::ffi::{CStr, c_char, c_void};

use emsg_id3::{
    emsg_id3_library_version,
    error::EmsgId3Error,
    tracker::{
        emsg_id3_tracker_free, emsg_id3_tracker_get_last_error, emsg_id3_tracker_handle_input,
        emsg_id3_tracker_new, emsg_id3_tracker_start_segment,
    },
};

#[derive(Debug, Default, PartialEq)]
struct Received {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    year: Option<String>,
    artwork_url: Option<String>,
    radio_station: Option<String>,
    station_owner: Option<String>,
}

unsafe fn to_string(s: *const c_char) -> Option<String> {
    if s.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(s) }.to_str().unwrap().to_owned())
    }
}

unsafe extern "C" fn on_metadata(
    user_data: *mut c_void,
    title: *const c_char,
    artist: *const c_char,
    album: *const c_char,
    year: *const c_char,
    artwork_url: *const c_char,
    radio_station: *const c_char,
    station_owner: *const c_char,
) {
    let received = unsafe { &mut *(user_data as *mut Vec<Received>) };
    unsafe {
        received.push(Received {
            title: to_string(title),
            artist: to_string(artist),
            album: to_string(album),
            year: to_string(year),
            artwork_url: to_string(artwork_url),
            radio_station: to_string(radio_station),
            station_owner: to_string(station_owner),
        });
    }
}

fn segment() -> Vec<u8> {
    let mut id3 = b"ID3\x04\0\0\0\0\0\0".to_vec();
    for (id, body) in [(b"TIT2", &b"Bohemian Rhapsody"[..]), (b"TPE1", &b"Queen"[..])] {
        id3.extend_from_slice(id);
        id3.extend_from_slice(&(body.len() as u32).to_be_bytes());
        id3.extend_from_slice(&[0, 0]);
        id3.extend_from_slice(body);
    }

    let mut buf = b"junk".to_vec();
    buf.extend_from_slice(&((8 + 16 + id3.len()) as u32).to_be_bytes());
    buf.extend_from_slice(b"emsg");
    buf.extend_from_slice(&[0; 16]);
    buf.extend_from_slice(&id3);
    buf
}

#[test]
fn library_version() {
    let version = unsafe { CStr::from_ptr(emsg_id3_library_version()) };
    assert!(!version.to_bytes().is_empty());
}

#[test]
fn handle_input_in_chunks() {
    let data = segment();
    let mut received: Vec<Received> = Vec::new();
    let user_data = &mut received as *mut Vec<Received> as *mut c_void;

    unsafe {
        let tracker = emsg_id3_tracker_new(c"Example FM".as_ptr(), std::ptr::null());
        for chunk in data.chunks(7) {
            let result = emsg_id3_tracker_handle_input(
                tracker,
                chunk.as_ptr(),
                chunk.len(),
                Some(on_metadata),
                user_data,
            );
            assert_eq!(result, EmsgId3Error::Ok);
        }

        // 同じセグメントに追記しても重複して通知されない
        let result = emsg_id3_tracker_handle_input(
            tracker,
            [0u8; 4].as_ptr(),
            4,
            Some(on_metadata),
            user_data,
        );
        assert_eq!(result, EmsgId3Error::Ok);
        assert_eq!(received.len(), 1);

        // 新しいセグメントでは再び通知される
        assert_eq!(emsg_id3_tracker_start_segment(tracker), EmsgId3Error::Ok);
        let result = emsg_id3_tracker_handle_input(
            tracker,
            data.as_ptr(),
            data.len(),
            Some(on_metadata),
            user_data,
        );
        assert_eq!(result, EmsgId3Error::Ok);

        emsg_id3_tracker_free(tracker);
    }

    let expected = Received {
        title: Some("Bohemian Rhapsody".to_owned()),
        artist: Some("Queen".to_owned()),
        radio_station: Some("Example FM".to_owned()),
        ..Default::default()
    };
    assert_eq!(received.len(), 2);
    assert_eq!(received[0], expected);
    assert_eq!(received[1], expected);
}

#[test]
fn null_pointers() {
    unsafe {
        assert_eq!(
            emsg_id3_tracker_start_segment(std::ptr::null_mut()),
            EmsgId3Error::NullPointer
        );
        assert!(!emsg_id3_tracker_get_last_error(std::ptr::null()).is_null());

        let tracker = emsg_id3_tracker_new(std::ptr::null(), std::ptr::null());
        assert!(emsg_id3_tracker_get_last_error(tracker).is_null());

        let result = emsg_id3_tracker_handle_input(
            tracker,
            std::ptr::null(),
            10,
            Some(on_metadata),
            std::ptr::null_mut(),
        );
        assert_eq!(result, EmsgId3Error::NullPointer);
        assert!(!emsg_id3_tracker_get_last_error(tracker).is_null());

        let result =
            emsg_id3_tracker_handle_input(tracker, [0u8].as_ptr(), 1, None, std::ptr::null_mut());
        assert_eq!(result, EmsgId3Error::NullPointer);

        emsg_id3_tracker_free(tracker);
        emsg_id3_tracker_free(std::ptr::null_mut());
    }
}
