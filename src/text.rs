//! ID3v2 フレームの本体を文字列に変換する際に使う、文字コードの判定や破損データの除去を行う関数群
//!
//! エンコーダーが出力するテキストフレームは、UTF-8 と Latin-1 (ISO-8859-1) が混在していたり、
//! 制御文字や `_` が紛れ込んでいたりするので、それらを取り除いた上で値として扱う
use alloc::string::String;

/// テキストの先頭と末尾から取り除く文字
const TRIMMED_CHARS: [char; 5] = ['\0', ' ', '\t', '\n', '\r'];

/// C0 制御文字、DEL、C1 制御文字のいずれかかどうか
pub fn is_control_char(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{1F}' | '\u{7F}'..='\u{9F}')
}

/// バイト列を Latin-1 (ISO-8859-1) として解釈して文字列に変換する
///
/// Latin-1 の各バイトは同じ値の Unicode コードポイントに対応するので、この変換は失敗しない
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// 文字列から制御文字を全て取り除く
pub fn strip_control_chars(s: &str) -> String {
    s.chars().filter(|&c| !is_control_char(c)).collect()
}

fn clean_decoded(s: &str) -> String {
    let s = s.trim_matches(TRIMMED_CHARS.as_slice());
    let s: String = s
        .chars()
        .filter(|&c| !is_control_char(c) && c != '_')
        .collect();
    s.trim_matches(TRIMMED_CHARS.as_slice()).into()
}

/// テキストフレームの本体を、余計な文字を取り除いた文字列に変換する
///
/// まず UTF-8 として解釈し、結果が空になるか置換文字 (U+FFFD) を含む場合には
/// Latin-1 として解釈し直す。
/// どちらでも空文字列になる場合には [`None`] が返される
pub fn clean_text(bytes: &[u8]) -> Option<String> {
    let utf8 = clean_decoded(&String::from_utf8_lossy(bytes));
    let cleaned = if utf8.is_empty() || utf8.contains(char::REPLACEMENT_CHARACTER) {
        clean_decoded(&decode_latin1(bytes))
    } else {
        utf8
    };
    (!cleaned.is_empty()).then_some(cleaned)
}

/// 文字列中で最初に現れる、四桁連続した ASCII の数字を年として取り出す
///
/// `2023` だけでなく `2023-01-15T10:00:00` のような日時表現にも対応する
pub fn extract_year(s: &str) -> Option<String> {
    s.as_bytes()
        .windows(4)
        .find(|w| w.iter().all(u8::is_ascii_digit))
        .map(|w| w.iter().map(|&b| char::from(b)).collect())
}

/// WXXX フレームの本体からアートワークの URL を取り出す
///
/// 観測されているエンコーダーは、説明文（解像度の指定など）と URL を区切り文字なしで連結して出力するので、
/// 最初に現れる `http` より前の部分は捨てる。
/// URL 自体を壊さないように、一般のテキストとは違って `_` や空白の除去は行わない
pub fn extract_artwork_url(bytes: &[u8]) -> Option<String> {
    let text = decode_latin1(bytes);
    let start = text.find("http")?;
    let url = strip_control_chars(&text[start..]);
    (url.starts_with("http://") || url.starts_with("https://")).then_some(url)
}
