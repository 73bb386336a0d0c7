//! バイト列から `emsg` ボックスの候補を探し出すためのモジュール
//!
//! fMP4 のボックス構造は解釈せず、全てのバイト位置で `emsg` シグネチャの有無を確認する。
//! エンコーダーによっては親ボックスのレイアウトが仕様に準拠していないことがあるため、
//! ボックスツリーを辿るよりもこちらの方が取りこぼしが少ない。
use crate::{ByteSpan, Decode, FourCc};

/// `emsg` ボックスの候補
///
/// [`EmsgBoxScanner`] が返す時点で `span` が元のバイト列に収まっていることは保証されているが、
/// 中身が本当に EMSG ボックスであるかどうかは分からない（偶然一致した可能性がある）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmsgBox {
    /// ボックス先頭のサイズフィールドの値
    pub declared_size: u32,

    /// 元のバイト列の中でのボックス全体の範囲
    pub span: ByteSpan,
}

impl EmsgBox {
    /// ボックス種別
    pub const TYPE: FourCc = FourCc::new(*b"emsg");

    /// サイズフィールドとボックス種別からなるヘッダーのバイト数
    pub const HEADER_SIZE: usize = 4 + 4;

    /// `offset` の位置に `emsg` ボックスのヘッダーがあるかを確認し、あればボックスの候補を返す
    ///
    /// 宣言されたサイズが 0 の場合や、バイト列の末尾を越える場合には [`None`] が返される
    /// （後者は単にデータが揃っていないだけなので、追記後に再度走査すれば見つかる可能性がある）
    pub fn detect(buf: &[u8], offset: usize) -> Option<Self> {
        let declared_size = Self::declared_size_at(buf, offset)?;
        if declared_size == 0 {
            log::trace!("Ignored zero-sized emsg box at offset {offset}");
            return None;
        }

        let span = ByteSpan::new(offset, declared_size as usize);
        if !span.fits_in(buf.len()) {
            log::trace!(
                "Ignored emsg box at offset {offset}: declared_size={declared_size}, available={}",
                buf.len() - offset
            );
            return None;
        }

        Some(Self {
            declared_size,
            span,
        })
    }

    /// `offset` の位置に `emsg` ボックスのヘッダーがあれば、そのサイズフィールドの値を返す
    ///
    /// [`EmsgBox::detect()`] とは異なり、サイズが 0 の場合やバイト列の末尾を越える場合にも値を返す
    pub(crate) fn declared_size_at(buf: &[u8], offset: usize) -> Option<u32> {
        let header = buf.get(offset..offset.checked_add(Self::HEADER_SIZE)?)?;
        if header[4..] != Self::TYPE.get() {
            return None;
        }
        u32::decode(header).ok().map(|(size, _)| size)
    }
}

/// バイト列を先頭から一バイトずつ走査して `emsg` ボックスの候補を順に返すイテレーター
///
/// 走査は常に決定的で、同じバイト列からは同じ順序で同じ候補が得られる
#[derive(Debug, Clone)]
pub struct EmsgBoxScanner<'a> {
    buf: &'a [u8],
    position: usize,
}

impl<'a> EmsgBoxScanner<'a> {
    /// 指定されたバイト列を走査する [`EmsgBoxScanner`] インスタンスを作成する
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, position: 0 }
    }

}

impl Iterator for EmsgBoxScanner<'_> {
    type Item = EmsgBox;

    fn next(&mut self) -> Option<Self::Item> {
        let last = self.buf.len().checked_sub(EmsgBox::HEADER_SIZE)?;
        while self.position <= last {
            let offset = self.position;
            self.position += 1;

            // ボックスが見つかっても読み飛ばさずに次のバイトから走査を続ける
            //（サイズフィールドが壊れている場合に、本物のボックスを見逃さないようにするため）
            if let Some(b) = EmsgBox::detect(self.buf, offset) {
                return Some(b);
            }
        }
        None
    }
}

/// `buf` に含まれる `emsg` ボックスの候補を走査するイテレーターを返す
pub fn scan_emsg_boxes(buf: &[u8]) -> EmsgBoxScanner<'_> {
    EmsgBoxScanner::new(buf)
}
