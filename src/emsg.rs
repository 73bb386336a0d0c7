//! `emsg` ボックスの中から ID3v2 タグの範囲を取り出すためのモジュール
use crate::{ByteSpan, EmsgBox};

/// `emsg` ボックスのメッセージデータ中で見つかった ID3v2 タグ
///
/// 範囲は `ID3` シグネチャの位置から始まり、ボックスの末尾まで続く
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id3Payload {
    /// 元のバイト列の中でのタグの範囲
    pub span: ByteSpan,
}

impl Id3Payload {
    /// ID3v2 タグの先頭に置かれるシグネチャ
    pub const SIGNATURE: [u8; 3] = *b"ID3";

    /// ID3v2 タグのヘッダーのバイト数
    pub const HEADER_SIZE: usize = 10;

    /// タグ全体のバイト列を返す
    pub fn bytes<'a>(&self, buf: &'a [u8]) -> Option<&'a [u8]> {
        self.span.slice(buf)
    }
}

impl EmsgBox {
    /// ボックスとして受理する最小のバイト数
    pub const MIN_SIZE: usize = 16;

    /// ボックス先頭から、`ID3` シグネチャの探索を開始する位置までのバイト数
    ///
    /// version や timescale などのフィールドは解釈せずに読み飛ばす
    pub const MESSAGE_DATA_OFFSET: usize = 16;

    /// ボックス内で最初に見つかった ID3v2 タグを返す
    ///
    /// ボックスが小さすぎる場合や、シグネチャが見つからない場合には [`None`] が返される
    pub fn id3_payload(&self, buf: &[u8]) -> Option<Id3Payload> {
        self.id3_payload_candidates(buf).next()
    }

    /// ボックス内で `ID3` シグネチャが見つかった全ての位置を、先頭から順に走査するイテレーターを返す
    ///
    /// EMSG の scheme_id_uri に `ID3` という文字列が含まれているエンコーダーがあるため、
    /// 先頭の候補が本物のタグであるとは限らない
    pub fn id3_payload_candidates<'a>(&self, buf: &'a [u8]) -> Id3PayloadCandidates<'a> {
        let window = self.span.slice(buf).and_then(|box_bytes| {
            if box_bytes.len() < Self::MIN_SIZE {
                log::trace!(
                    "Too small emsg box at offset {}: size={}",
                    self.span.offset,
                    box_bytes.len()
                );
                return None;
            }
            Some(box_bytes)
        });

        Id3PayloadCandidates {
            box_bytes: window.unwrap_or_default(),
            box_offset: self.span.offset,
            position: Self::MESSAGE_DATA_OFFSET,
        }
    }
}

/// `emsg` ボックス内の ID3v2 タグの候補を順に返すイテレーター
#[derive(Debug, Clone)]
pub struct Id3PayloadCandidates<'a> {
    box_bytes: &'a [u8],
    box_offset: usize,
    position: usize,
}

impl Iterator for Id3PayloadCandidates<'_> {
    type Item = Id3Payload;

    fn next(&mut self) -> Option<Self::Item> {
        // シグネチャの後ろに少なくともタグヘッダー分のバイト列が残っている位置だけを探す
        let end = self.box_bytes.len().checked_sub(Id3Payload::HEADER_SIZE)?;
        while self.position < end {
            let i = self.position;
            self.position += 1;

            if self.box_bytes[i..].starts_with(&Id3Payload::SIGNATURE) {
                return Some(Id3Payload {
                    span: ByteSpan::new(self.box_offset + i, self.box_bytes.len() - i),
                });
            }
        }
        None
    }
}
