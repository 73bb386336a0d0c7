//! ユニットテスト用のバイト列を組み立てる関数群
use alloc::vec::Vec;

/// ID3v2 フレームを作る（サイズは synch-safe ではない通常のビッグエンディアン）
pub(crate) fn id3_frame(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut buf = id.to_vec();
    buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
    buf.extend_from_slice(&[0, 0]);
    buf.extend_from_slice(body);
    buf
}

/// ID3v2 のタグヘッダーの後にフレームを並べる
pub(crate) fn id3_tag(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = b"ID3\x04\0\0\0\0\0\0".to_vec();
    for f in frames {
        buf.extend_from_slice(f);
    }
    buf
}

/// 16 バイトのヘッダー領域の後にメッセージデータを置いた emsg ボックスを作る
pub(crate) fn emsg_box(message_data: &[u8]) -> Vec<u8> {
    let size = (8 + 16 + message_data.len()) as u32;
    let mut buf = size.to_be_bytes().to_vec();
    buf.extend_from_slice(b"emsg");
    buf.extend_from_slice(&[0; 16]);
    buf.extend_from_slice(message_data);
    buf
}

#[cfg(feature = "std")]
std::thread_local! {
    static PANIC_REQUESTED: core::cell::Cell<bool> = const { core::cell::Cell::new(false) };
}

/// [`with_panic()`] の実行中であればパニックする
#[cfg(feature = "std")]
pub(crate) fn panic_if_requested() {
    if PANIC_REQUESTED.with(|v| v.get()) {
        panic!("requested panic");
    }
}

/// 現在のスレッドでの `emsg` ボックスの処理をパニックさせながら `f` を実行する
#[cfg(feature = "std")]
pub(crate) fn with_panic<T>(f: impl FnOnce() -> T) -> T {
    PANIC_REQUESTED.with(|v| v.set(true));
    let result = f();
    PANIC_REQUESTED.with(|v| v.set(false));
    result
}

/// ログを記録するグローバルなロガーを排他的に取得する
#[cfg(feature = "std")]
pub(crate) fn logger() -> std::sync::MutexGuard<'static, logtest::Logger> {
    static LOGGER: std::sync::OnceLock<std::sync::Mutex<logtest::Logger>> =
        std::sync::OnceLock::new();
    LOGGER
        .get_or_init(|| std::sync::Mutex::new(logtest::Logger::start()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}
