//! fMP4 セグメント内の EMSG ボックスに埋め込まれた ID3v2 タグから、楽曲のメタデータを抽出するためのライブラリ
//!
//! 処理は以下の三段階で構成される:
//! 1. [`scan_emsg_boxes()`] でバイト列から `emsg` ボックスの候補を探す
//! 2. [`EmsgBox::id3_payload()`] でボックス内の ID3v2 タグの範囲を特定する
//! 3. [`Id3Payload::decode_metadata()`] で ID3v2 フレームをデコードして [`MetadataRecord`] を得る
//!
//! 通常は、これらをまとめて実行する [`MetadataExtractor`] を使えばいい。
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod auxiliary;
mod basic_types;
mod codec;
mod emsg;
mod extractor;
mod id3;
mod scanner;
pub mod text;

#[cfg(test)]
mod test_support;

pub use basic_types::{ByteSpan, FourCc};
pub use codec::{Decode, Error, ErrorKind, Result};
pub use emsg::{Id3Payload, Id3PayloadCandidates};
pub use extractor::{ExtractedMetadata, ExtractorOptions, MetadataExtractor, MetadataHandler};
pub use id3::{Id3Frame, Id3FrameHeader, Id3Frames, MetadataFields, MetadataRecord};
pub use scanner::{EmsgBox, EmsgBoxScanner, scan_emsg_boxes};

// [NOTE]
// Windows 環境では aux.rs というファイル名が予約語で、リポジトリに含まれていると git clone に失敗するため、
// ファイル名自体は auxiliary.rs にして lib.rs の中で aux モジュール以下に再エクスポートしている。
pub mod aux {
    //! メタデータの抽出処理そのものとは直接は関係がない、利用側で便利な補助的なコンポーネントを集めたモジュール

    pub use crate::auxiliary::{
        DEFAULT_MAX_BUFFER_SIZE, SegmentMetadataTracker, SegmentTrackerOptions,
    };
}
