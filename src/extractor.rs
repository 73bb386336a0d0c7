//! `emsg` ボックスの走査から [`MetadataRecord`] の生成までをまとめて行うためのモジュール
use alloc::{string::String, vec::Vec};

use crate::{EmsgBox, Id3Payload, MetadataRecord, scan_emsg_boxes};

/// [`MetadataExtractor`] 用のオプション
///
/// 放送局名などのストリームからは取得できない値は、ここで指定したものがそのまま [`MetadataRecord`] に設定される
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct ExtractorOptions {
    /// [`MetadataRecord::radio_station`] に設定する値
    pub radio_station: Option<String>,

    /// [`MetadataRecord::station_owner`] に設定する値
    pub station_owner: Option<String>,
}

impl ExtractorOptions {
    /// 放送局名を設定する
    pub fn with_radio_station<T: Into<String>>(mut self, name: T) -> Self {
        self.radio_station = Some(name.into());
        self
    }

    /// 放送局の運営者名を設定する
    pub fn with_station_owner<T: Into<String>>(mut self, name: T) -> Self {
        self.station_owner = Some(name.into());
        self
    }
}

/// 抽出されたメタデータと、その抽出元の位置
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractedMetadata {
    /// メタデータを含んでいた `emsg` ボックス
    pub emsg_box: EmsgBox,

    /// メタデータのデコード元となった ID3v2 タグ
    pub payload: Id3Payload,

    /// デコードされたメタデータ
    pub record: MetadataRecord,
}

/// メタデータが見つかるたびに呼び出されるハンドラー
pub trait MetadataHandler {
    /// メタデータを受け取る
    fn on_metadata(&mut self, record: &MetadataRecord);
}

impl<F: FnMut(&MetadataRecord)> MetadataHandler for F {
    fn on_metadata(&mut self, record: &MetadataRecord) {
        self(record)
    }
}

/// バイト列から楽曲のメタデータを抽出するための構造体
///
/// 内部状態は持たないので、同じバイト列に対しては何度呼び出しても同じ結果が返される。
/// そのため、追記され続けるバッファを繰り返し渡すと同じメタデータが重複して返されることになる。
/// 重複を除去したい場合には [`SegmentMetadataTracker`](crate::aux::SegmentMetadataTracker) を使うこと
#[derive(Debug, Default, Clone)]
pub struct MetadataExtractor {
    options: ExtractorOptions,
}

impl MetadataExtractor {
    /// デフォルトのオプションで [`MetadataExtractor`] インスタンスを生成する
    pub fn new() -> Self {
        Self::with_options(ExtractorOptions::default())
    }

    /// オプションを指定して [`MetadataExtractor`] インスタンスを生成する
    pub fn with_options(options: ExtractorOptions) -> Self {
        Self { options }
    }

    /// `buf` に含まれる全てのメタデータを、バイト列内での出現順に抽出する
    ///
    /// 各 `emsg` ボックスの扱いは [`MetadataExtractor::extract_from_box()`] と同じで、
    /// 最初の `ID3` シグネチャからメタデータが得られなかった場合には後続の候補も試す。
    ///
    /// 不正なデータは全て読み飛ばされるので、この処理が失敗することはない
    /// （最悪の場合でも空の [`Vec`] が返されるだけ）
    pub fn extract(&self, buf: &[u8]) -> Vec<ExtractedMetadata> {
        guard_panic(buf.len(), || {
            scan_emsg_boxes(buf)
                .filter_map(|emsg_box| self.extract_from_box(buf, emsg_box))
                .collect()
        })
    }

    /// `emsg` ボックス一つ分のメタデータを抽出する
    ///
    /// ボックス内に ID3v2 タグの候補が複数ある場合には、先頭から順に試してメタデータが得られた最初の候補を採用する。
    /// そのため [`EmsgBox::id3_payload()`] が返す最初の候補がデコードできなくても、結果が返されることがある。
    /// 最初の候補だけを対象にしたい場合には [`EmsgBox::id3_payload()`] と
    /// [`Id3Payload::decode_metadata()`] を直接使うこと。
    ///
    /// 前の候補のフレームとして既に走査した範囲にある候補は試さない
    pub fn extract_from_box(&self, buf: &[u8], emsg_box: EmsgBox) -> Option<ExtractedMetadata> {
        let (found, visited_frames) = self.find_in_box(buf, emsg_box);
        match &found {
            Some(m) => log::debug!(
                "Found metadata at offset {}: title={}, artist={}, album={}, year={}, artwork_url={}",
                m.payload.span.offset,
                m.record.title.is_some(),
                m.record.artist.is_some(),
                m.record.album.is_some(),
                m.record.year.is_some(),
                m.record.artwork_url.is_some(),
            ),
            None => log::trace!(
                "No metadata in emsg box at offset {} ({visited_frames} frames visited)",
                emsg_box.span.offset
            ),
        }
        found
    }

    /// メタデータと、それを探すために走査したフレームの総数を返す
    fn find_in_box(&self, buf: &[u8], emsg_box: EmsgBox) -> (Option<ExtractedMetadata>, usize) {
        #[cfg(all(test, feature = "std"))]
        crate::test_support::panic_if_requested();

        let mut walked_end = 0;
        let mut visited_frames = 0;
        for payload in emsg_box.id3_payload_candidates(buf) {
            if payload.span.offset < walked_end {
                continue;
            }

            let walk = payload.walk(buf);
            visited_frames += walk.frame_count;
            if walk.frame_count > 0 {
                walked_end = walk.end;
            }

            let Some(record) = walk.fields.into_record(payload.span.offset, &self.options) else {
                continue;
            };
            let found = ExtractedMetadata {
                emsg_box,
                payload,
                record,
            };
            return (Some(found), visited_frames);
        }
        (None, visited_frames)
    }

    /// `buf` に含まれる全てのメタデータを抽出して、出現順に `handler` に渡す
    ///
    /// `handler` はバイト列の走査が全て完了した後に呼び出される
    pub fn extract_to<H: MetadataHandler>(&self, buf: &[u8], mut handler: H) {
        for m in self.extract(buf) {
            handler.on_metadata(&m.record);
        }
    }

    /// `buf` に含まれる全てのメタデータを出現順に返す
    pub fn records(&self, buf: &[u8]) -> Vec<MetadataRecord> {
        self.extract(buf).into_iter().map(|m| m.record).collect()
    }
}

/// メタデータの抽出はメディアデータの処理の副次的なものなので、
/// 想定外のパニックが発生しても呼び出し元のストリーム処理を止めずに `T::default()` を返す
pub(crate) fn guard_panic<T, F>(buf_len: usize, f: F) -> T
where
    T: Default,
    F: FnOnce() -> T + core::panic::UnwindSafe,
{
    #[cfg(feature = "std")]
    let result = std::panic::catch_unwind(f).unwrap_or_else(|_| {
        log::warn!("Panicked while extracting metadata from {buf_len} bytes");
        T::default()
    });

    #[cfg(not(feature = "std"))]
    let result = {
        let _ = buf_len;
        f()
    };

    result
}
