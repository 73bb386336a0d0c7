#![expect(clippy::missing_safety_doc)]
pub mod error;
pub mod tracker;

/// ライブラリのバージョンを取得する
///
/// # 戻り値
///
/// バージョン文字列へのポインタ（NULL終端）
#[unsafe(no_mangle)]
pub extern "C" fn emsg_id3_library_version() -> *const std::ffi::c_char {
    concat!(env!("SHIGUREDO_EMSG_ID3_VERSION"), "\0").as_ptr().cast()
}
