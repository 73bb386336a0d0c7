#[cfg(feature = "std")]
use std::{backtrace::Backtrace, panic::Location};

use alloc::string::String;

use crate::FourCc;

/// このライブラリ用の Result 型
pub type Result<T> = core::result::Result<T, Error>;

/// デコード操作のエラーの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// データコンテンツが無効または破損している
    InvalidData,

    /// 提供されたバッファがデコードに必要なサイズに満たない
    InsufficientBuffer,
}

/// エラー型
///
/// EMSG や ID3 のデコード処理の内部で使われ、公開 API の境界では「何も見つからなかった」扱いに変換される
pub struct Error {
    /// 発生したエラーの種類
    pub kind: ErrorKind,

    /// エラーが発生した理由
    pub reason: String,

    /// エラーが作成されたソースコードの場所
    #[cfg(feature = "std")]
    pub location: &'static Location<'static>,

    /// エラーが発生したボックスないしフレームの識別子
    pub fourcc: Option<FourCc>,

    /// エラー発生箇所を示すバックトレース
    ///
    /// バックトレースは `RUST_BACKTRACE` 環境変数が設定されていない場合には取得されない
    #[cfg(feature = "std")]
    pub backtrace: Backtrace,
}

impl Error {
    /// [`Error`] インスタンスを生成する
    #[track_caller]
    pub fn new(kind: ErrorKind) -> Self {
        Self::with_reason(kind, String::new())
    }

    /// エラー理由つきで [`Error`] インスタンスを生成する
    #[track_caller]
    pub fn with_reason<T: Into<String>>(kind: ErrorKind, reason: T) -> Self {
        Self {
            kind,
            reason: reason.into(),
            #[cfg(feature = "std")]
            location: std::panic::Location::caller(),
            fourcc: None,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// エラーの発生箇所となったボックスやフレームの識別子を設定する
    pub fn with_fourcc(mut self, fourcc: FourCc) -> Self {
        if self.fourcc.is_none() {
            self.fourcc = Some(fourcc);
        }
        self
    }

    #[track_caller]
    pub(crate) fn invalid_data<T: Into<String>>(reason: T) -> Self {
        Self::with_reason(ErrorKind::InvalidData, reason)
    }

    #[track_caller]
    pub(crate) fn insufficient_buffer() -> Self {
        Self::new(ErrorKind::InsufficientBuffer)
    }

    #[track_caller]
    pub(crate) fn check_buffer_size(required_size: usize, buf: &[u8]) -> Result<()> {
        if buf.len() < required_size {
            Err(Self::insufficient_buffer())
        } else {
            Ok(())
        }
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self}")
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if let Some(fourcc) = self.fourcc {
            write!(f, "[{fourcc}] ")?;
        }

        write!(f, "{:?}: {}", self.kind, self.reason)?;

        #[cfg(feature = "std")]
        {
            write!(f, " (at {}:{})", self.location.file(), self.location.line())?;
            if self.backtrace.status() == std::backtrace::BacktraceStatus::Captured {
                write!(f, "\n\nBacktrace:\n{}", self.backtrace)?;
            }
        }

        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// バイト列から `Self` に変換するためのトレイト
pub trait Decode: Sized {
    /// バイト列からこの型の値をデコードする
    ///
    /// 成功時には、デコードされた値とデコードに消費されたバイト数のタプルが、
    /// 失敗時には [`Error`] が返される
    fn decode(buf: &[u8]) -> Result<(Self, usize)>;

    /// オフセット位置からバイト列をデコードし、オフセットを自動で進める
    fn decode_at(buf: &[u8], offset: &mut usize) -> Result<Self> {
        let rest = buf.get(*offset..).ok_or_else(Error::insufficient_buffer)?;
        let (decoded, size) = Self::decode(rest)?;
        *offset += size;
        Ok(decoded)
    }
}

impl Decode for u8 {
    #[track_caller]
    fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        Error::check_buffer_size(1, buf)?;
        Ok((buf[0], 1))
    }
}

impl Decode for u16 {
    #[track_caller]
    fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        Error::check_buffer_size(2, buf)?;
        Ok((Self::from_be_bytes([buf[0], buf[1]]), 2))
    }
}

impl Decode for u32 {
    #[track_caller]
    fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        Error::check_buffer_size(4, buf)?;
        Ok((Self::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]), 4))
    }
}

impl<T: Decode + Default + Copy, const N: usize> Decode for [T; N] {
    fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let mut items = [T::default(); N];
        let mut offset = 0;

        for item in &mut items {
            *item = T::decode_at(buf, &mut offset)?;
        }

        Ok((items, offset))
    }
}
