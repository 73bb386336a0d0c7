use crate::{Decode, Result};

/// 元のバイト列の中の範囲 `(offset, len)` を表す構造体
///
/// バイト列そのものは保持せず、必要になった時点で [`ByteSpan::slice()`] を使って取り出す
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ByteSpan {
    /// 範囲の開始位置
    pub offset: usize,

    /// 範囲のバイト数
    pub len: usize,
}

impl ByteSpan {
    /// 開始位置と長さを受け取って [`ByteSpan`] インスタンスを作成する
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// 範囲の終端位置（この位置自体は範囲に含まれない）を返す
    ///
    /// 終端位置が [`usize`] で表現できない場合には [`None`] が返される
    pub const fn end(self) -> Option<usize> {
        self.offset.checked_add(self.len)
    }

    /// この範囲が長さ `buf_len` のバイト列に収まっているかどうかを判定する
    pub const fn fits_in(self, buf_len: usize) -> bool {
        match self.end() {
            Some(end) => end <= buf_len,
            None => false,
        }
    }

    /// `other` がこの範囲に完全に含まれているかどうかを判定する
    pub fn contains(self, other: ByteSpan) -> bool {
        match (self.end(), other.end()) {
            (Some(end), Some(other_end)) => self.offset <= other.offset && other_end <= end,
            _ => false,
        }
    }

    /// `buf` からこの範囲に対応する部分を取り出す
    ///
    /// 範囲が `buf` に収まっていない場合には [`None`] が返される
    pub fn slice(self, buf: &[u8]) -> Option<&[u8]> {
        buf.get(self.offset..self.end()?)
    }
}

/// 四文字で表現されるボックス種別やフレーム識別子
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCc([u8; 4]);

impl FourCc {
    /// 四バイトの値を受け取って [`FourCc`] インスタンスを作成する
    pub const fn new(code: [u8; 4]) -> Self {
        Self(code)
    }

    /// 識別子を表すバイト列を返す
    pub const fn get(self) -> [u8; 4] {
        self.0
    }

    /// 全てのバイトが ASCII の英数字かどうか
    pub fn is_alphanumeric(self) -> bool {
        self.0.iter().all(|b| b.is_ascii_alphanumeric())
    }
}

impl Decode for FourCc {
    fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let (code, size) = <[u8; 4]>::decode(buf)?;
        Ok((Self(code), size))
    }
}

impl core::fmt::Debug for FourCc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if let Ok(s) = core::str::from_utf8(&self.0) {
            f.debug_tuple("FourCc").field(&s).finish()
        } else {
            f.debug_tuple("FourCc").field(&self.0).finish()
        }
    }
}

impl core::fmt::Display for FourCc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if let Ok(s) = core::str::from_utf8(&self.0) {
            write!(f, "{s}")
        } else {
            write!(f, "{:?}", self.0)
        }
    }
}
